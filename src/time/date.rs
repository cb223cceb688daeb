use crate::utils::errors::{Result, SimError};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// # Date
/// A month-granular simulation date: a year and a month-of-year in `0..=11`.
/// Backed by a `NaiveDate` pinned to the first day of the month.
///
/// ## Details
/// - `month_index` maps a date onto a single integer (`year * 12 + month`)
///   used for ordering, windows and rate lookups.
/// - Subtracting two dates yields whole months.
///
/// # Examples
/// ```
/// use metrosim::time::date::Date;
/// let date = Date::new(2006, 8);
/// assert_eq!(date.year(), 2006);
/// assert_eq!(date.month(), 8);
/// assert_eq!(date - Date::new(2006, 5), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Date {
    base_date: NaiveDate,
}

impl Date {
    /// Builds a date from a year and a zero-based month.
    ///
    /// Panics on `month > 11`; an out-of-range month is a programming
    /// error, not a recoverable condition.
    pub fn new(year: i32, month: u32) -> Date {
        let base_date = NaiveDate::from_ymd_opt(year, month + 1, 1);
        match base_date {
            Some(base_date) => Date { base_date },
            None => panic!("Invalid date: year {}, month {}", year, month),
        }
    }

    /// Rebuilds a date from a `month_index` value.
    pub fn from_month_index(index: i32) -> Date {
        Date::new(index.div_euclid(12), index.rem_euclid(12) as u32)
    }

    pub fn from_str(date: &str) -> Result<Date> {
        let mut parts = date.splitn(2, '-');
        let year = parts.next().and_then(|p| p.parse::<i32>().ok());
        let month = parts.next().and_then(|p| p.parse::<u32>().ok());
        match (year, month) {
            (Some(year), Some(month)) if (1..=12).contains(&month) => {
                Ok(Date::new(year, month - 1))
            }
            _ => Err(SimError::Fatal(format!(
                "Cannot parse '{}' as a YYYY-MM date",
                date
            ))),
        }
    }

    pub fn base_date(&self) -> NaiveDate {
        self.base_date
    }

    pub fn year(&self) -> i32 {
        self.base_date.year()
    }

    /// Zero-based month of year (`0..=11`).
    pub fn month(&self) -> u32 {
        self.base_date.month0()
    }

    /// Months since year zero; the crate-wide ordering key.
    pub fn month_index(&self) -> i32 {
        self.year() * 12 + self.month() as i32
    }

    /// Moves the date by `n` months (negative moves backwards).
    pub fn advance(&self, n: i32) -> Date {
        let base_date = if n >= 0 {
            self.base_date + Months::new(n as u32)
        } else {
            self.base_date - Months::new((-n) as u32)
        };
        Date { base_date }
    }

    /// True on the last month of a quarter.
    pub fn is_quarter_end(&self) -> bool {
        (self.month() + 1) % 3 == 0
    }
}

/// Subtracting two dates yields the difference in whole months.
impl Sub for Date {
    type Output = i32;

    fn sub(self, rhs: Self) -> Self::Output {
        self.month_index() - rhs.month_index()
    }
}

impl Add<i32> for Date {
    type Output = Date;

    fn add(self, rhs: i32) -> Self::Output {
        self.advance(rhs)
    }
}

impl AddAssign<i32> for Date {
    fn add_assign(&mut self, rhs: i32) {
        *self = self.advance(rhs);
    }
}

impl Sub<i32> for Date {
    type Output = Date;

    fn sub(self, rhs: i32) -> Self::Output {
        self.advance(-rhs)
    }
}

impl SubAssign<i32> for Date {
    fn sub_assign(&mut self, rhs: i32) {
        *self = self.advance(-rhs);
    }
}

impl Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month() + 1)
    }
}

impl Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Date, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Date::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::Date;
    use chrono::Datelike;

    #[test]
    fn test_month_index() {
        let date = Date::new(2006, 0);
        assert_eq!(date.month_index(), 2006 * 12);
        assert_eq!(date.base_date().day(), 1);
        assert_eq!(Date::new(2006, 11).month_index(), 2006 * 12 + 11);
        assert_eq!(Date::from_month_index(2006 * 12 + 11), Date::new(2006, 11));
    }

    #[test]
    fn test_advance_across_year_boundary() {
        let date = Date::new(2006, 10);
        assert_eq!(date.advance(3), Date::new(2007, 1));
        assert_eq!(date.advance(-11), Date::new(2005, 11));
        assert_eq!(date + 14, Date::new(2008, 0));
        let mut rolling = Date::new(2006, 10);
        rolling += 4;
        assert_eq!(rolling, Date::new(2007, 2));
        rolling -= 2;
        assert_eq!(rolling, Date::new(2007, 0));
        assert_eq!(rolling - 1, Date::new(2006, 11));
    }

    #[test]
    fn test_difference_in_months() {
        assert_eq!(Date::new(2007, 2) - Date::new(2006, 11), 3);
        assert_eq!(Date::new(2006, 0) - Date::new(2006, 0), 0);
        assert_eq!(Date::new(2005, 6) - Date::new(2006, 6), -12);
    }

    #[test]
    fn test_quarter_end() {
        assert!(Date::new(2006, 2).is_quarter_end());
        assert!(Date::new(2006, 11).is_quarter_end());
        assert!(!Date::new(2006, 0).is_quarter_end());
    }

    #[test]
    fn test_parse_and_display() {
        let date = Date::from_str("2006-09").unwrap();
        assert_eq!(date, Date::new(2006, 8));
        assert_eq!(date.to_string(), "2006-09");
        assert!(Date::from_str("2006").is_err());
        assert!(Date::from_str("2006-13").is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let date = Date::new(1999, 3);
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, "\"1999-04\"");
        let back: Date = serde_json::from_str(&json).unwrap();
        assert_eq!(back, date);
    }
}
