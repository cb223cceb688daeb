use std::collections::HashMap;

use crate::utils::errors::{Result, SimError};
use serde::{Deserialize, Serialize};

/// # ZoneSystem
/// A bijection between contiguous internal zone indices and external
/// zone numbers.
#[derive(Debug, Clone, Default)]
pub struct ZoneSystem {
    numbers: Vec<i32>,
    indices: HashMap<i32, usize>,
}

impl ZoneSystem {
    pub fn new(numbers: Vec<i32>) -> ZoneSystem {
        let indices = numbers
            .iter()
            .enumerate()
            .map(|(index, &number)| (number, index))
            .collect();
        ZoneSystem { numbers, indices }
    }

    /// # Errors
    ///
    /// Returns `IndexOutOfRange` when `index` is not a valid zone index.
    pub fn zone_number(&self, index: usize) -> Result<i32> {
        self.numbers.get(index).copied().ok_or_else(|| {
            SimError::IndexOutOfRange(format!("zone index {} out of range", index))
        })
    }

    /// # Errors
    ///
    /// Returns `MissingZoneData` when `number` is unknown to the system.
    pub fn zone_index(&self, number: i32) -> Result<usize> {
        self.indices.get(&number).copied().ok_or_else(|| {
            SimError::MissingZoneData(format!("zone number {} not in zone system", number))
        })
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}

/// Per-zone land-use shares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LandUse {
    pub residential: f32,
    pub commercial: f32,
    pub open: f32,
    pub industrial: f32,
}

impl LandUse {
    pub fn new(residential: f32, commercial: f32, open: f32, industrial: f32) -> LandUse {
        LandUse {
            residential,
            commercial,
            open,
            industrial,
        }
    }
}
