use std::fmt::Display;

use crate::core::store::SimStore;
use crate::core::traits::HasReferenceDate;
use crate::utils::errors::Result;

/// One line of the yearly summary output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearlySummary {
    pub year: i32,
    pub dwellings_sold: u32,
    pub households_remaining: usize,
    pub dwellings_remaining: usize,
    pub average_sale_price: f32,
    pub average_personal_income: f32,
}

impl Display for YearlySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: DwellingsSold={} HouseholdsRemaining={} DwellingsRemaining={} AverageSalePrice={:.2} AveragePersonalIncome={:.2}",
            self.year,
            self.dwellings_sold,
            self.households_remaining,
            self.dwellings_remaining,
            self.average_sale_price,
            self.average_personal_income
        )
    }
}

/// Mean personal income over living persons at the store's current
/// date; zero for an empty population.
///
/// # Errors
///
/// Propagates `MissingRate` from salary conversion.
pub fn average_personal_income(store: &SimStore) -> Result<f32> {
    let now = store.reference_date();
    let mut total = 0.0f64;
    let mut count = 0u32;
    for person in store.persons().iter() {
        if !person.living {
            continue;
        }
        count += 1;
        for job in &person.jobs {
            total += f64::from(store.inflation().convert(job.salary, now)?.amount);
        }
    }
    if count == 0 {
        Ok(0.0)
    } else {
        Ok((total / f64::from(count)) as f32)
    }
}
