use std::collections::HashMap;

use super::money::Money;
use crate::time::date::Date;
use crate::utils::errors::{Result, SimError};

/// # InflationStore
/// A store for monthly inflation rates, keyed by absolute month index.
///
/// ## Details
/// - `convert` rescales a [`Money`] from its creation date to a target
///   date using the ratio of the two monthly rates.
/// - An empty store means no inflation data is configured: amounts pass
///   through unchanged and only the date is restamped.
#[derive(Clone, Default)]
pub struct InflationStore {
    rates: HashMap<i32, f64>,
}

impl InflationStore {
    pub fn new() -> InflationStore {
        InflationStore {
            rates: HashMap::new(),
        }
    }

    /// Replaces the rate series; `series` maps each date to its index value.
    pub fn with_rates(&mut self, series: HashMap<Date, f64>) -> &mut Self {
        self.rates = series
            .into_iter()
            .map(|(date, rate)| (date.month_index(), rate))
            .collect();
        self
    }

    pub fn add_rate(&mut self, date: Date, rate: f64) {
        self.rates.insert(date.month_index(), rate);
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    fn rate(&self, date: Date) -> f64 {
        self.rates.get(&date.month_index()).copied().unwrap_or(0.0)
    }

    /// Converts `money` to the price level of `to`.
    ///
    /// # Errors
    ///
    /// Returns `MissingRate` when rates are configured but either end of
    /// the conversion has a zero or absent rate.
    pub fn convert(&self, money: Money, to: Date) -> Result<Money> {
        if self.rates.is_empty() {
            return Ok(Money::new(money.amount, to));
        }
        let from_rate = self.rate(money.when_created);
        let to_rate = self.rate(to);
        if from_rate == 0.0 || to_rate == 0.0 {
            return Err(SimError::MissingRate(format!(
                "no usable rate pair for {} -> {}",
                money.when_created, to
            )));
        }
        let amount = (f64::from(money.amount) * to_rate / from_rate) as f32;
        Ok(Money::new(amount, to))
    }
}
