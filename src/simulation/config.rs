use serde::{Deserialize, Serialize};

use crate::models::participation::ParticipationCoefficients;
use crate::time::date::Date;
use crate::utils::errors::{Result, SimError};

/// # SimConfig
/// Run parameters, loadable from a JSON file. Every field has a
/// default, so a partial file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// First simulated month.
    pub start: Date,
    /// Number of simulated years.
    pub years: u32,
    /// Root seed; each month runs on `year · random_seed + month`.
    pub random_seed: u32,
    /// Cap on auction rounds per month.
    pub max_iterations: u32,
    /// Bids a buyer attempts per eligible category.
    pub choice_set_size: usize,
    /// Room-count ceiling for categorisation.
    pub max_bedrooms: i32,
    /// Multiplicative asking-price decay per month on the market.
    pub monthly_time_decay: f64,
    /// Dwellings added each year before the first clear.
    pub new_dwellings_per_year: u32,
    pub hiring_probability: f64,
    pub average_salary: f64,
    pub salary_std_dev: f64,
    /// Fixed labour-force-participation covariate of the opt-in logit.
    pub labour_force_participation: f64,
    pub non_mover_ratio: f64,
    /// Per-month birth-rate-change series, indexed from `start`; absent
    /// entries count as zero.
    pub birth_rate_change: Vec<f64>,
    pub participation: ParticipationCoefficients,
}

impl Default for SimConfig {
    fn default() -> SimConfig {
        SimConfig {
            start: Date::new(1986, 0),
            years: 10,
            random_seed: 1,
            max_iterations: 20,
            choice_set_size: 10,
            max_bedrooms: 7,
            monthly_time_decay: 0.95,
            new_dwellings_per_year: 50,
            hiring_probability: 0.02,
            average_salary: 40_000.0,
            salary_std_dev: 10_000.0,
            labour_force_participation: 0.658,
            non_mover_ratio: 0.95,
            birth_rate_change: Vec::new(),
            participation: ParticipationCoefficients::default(),
        }
    }
}

impl SimConfig {
    /// # Errors
    ///
    /// Returns `ConfigMissing` when the file cannot be read or parsed.
    pub fn from_file(path: &str) -> Result<SimConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SimError::ConfigMissing(format!("cannot read {}: {}", path, e)))?;
        let config: SimConfig = serde_json::from_str(&contents)
            .map_err(|e| SimError::ConfigMissing(format!("cannot parse {}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigMissing` naming the first out-of-range parameter.
    pub fn validate(&self) -> Result<()> {
        if self.max_bedrooms < 1 {
            return Err(SimError::ConfigMissing(format!(
                "max_bedrooms must be at least 1, got {}",
                self.max_bedrooms
            )));
        }
        if self.monthly_time_decay <= 0.0 || self.monthly_time_decay > 1.0 {
            return Err(SimError::ConfigMissing(format!(
                "monthly_time_decay must be in (0, 1], got {}",
                self.monthly_time_decay
            )));
        }
        if !(0.0..=1.0).contains(&self.labour_force_participation) {
            return Err(SimError::ConfigMissing(format!(
                "labour_force_participation must be in [0, 1], got {}",
                self.labour_force_participation
            )));
        }
        Ok(())
    }
}
