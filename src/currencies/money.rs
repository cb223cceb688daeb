use crate::time::date::Date;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// # Money
/// An amount stamped with the date it was created. Amounts created at
/// different dates are only comparable after conversion through an
/// [`InflationStore`](crate::currencies::inflationstore::InflationStore).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: f32,
    pub when_created: Date,
}

impl Money {
    pub fn new(amount: f32, when_created: Date) -> Money {
        Money {
            amount,
            when_created,
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} ({})", self.amount, self.when_created)
    }
}
