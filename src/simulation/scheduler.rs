use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::ProgressBar;
use tracing::{error, info};

use super::config::SimConfig;
use super::stats::{average_personal_income, YearlySummary};
use crate::core::store::SimStore;
use crate::market::clearing::{ClearingEngine, MonthOutcome};
use crate::math::random::Substream;
use crate::models::bidding::BidModel;
use crate::models::hedonic::HedonicPriceModel;
use crate::models::participation::ParticipationModel;
use crate::models::supply::SupplyGenerator;
use crate::time::date::Date;
use crate::utils::errors::{Result, SimError};

/// # Simulation
/// The run driver. Owns the store and the behavioural models and walks
/// the yearly/monthly lifecycle: yearly supply, twelve monthly clears,
/// a summary line per year.
///
/// ## Details
/// - Fatal tick errors abort the month with a single failure line and
///   the run moves on to the next month.
/// - An empty dwelling or person repository at a yearly start ends the
///   run with `EmptyPopulation`.
/// - A shutdown request is honoured at the next month boundary.
pub struct Simulation {
    store: SimStore,
    config: SimConfig,
    pricing: HedonicPriceModel,
    participation: ParticipationModel,
    bidding: BidModel,
    supply: SupplyGenerator,
    engine: ClearingEngine,
    shutdown: Arc<AtomicBool>,
    summaries: Vec<YearlySummary>,
}

impl Simulation {
    /// # Errors
    ///
    /// Returns `ConfigMissing` for invalid parameters or an empty zone
    /// system.
    pub fn new(store: SimStore, config: SimConfig) -> Result<Simulation> {
        config.validate()?;
        if store.zone_system().is_empty() {
            return Err(SimError::ConfigMissing(
                "zone system collaborator is required".to_string(),
            ));
        }
        let pricing = HedonicPriceModel::new(config.monthly_time_decay);
        let participation = ParticipationModel::new(
            config.participation,
            config.labour_force_participation,
            config.non_mover_ratio,
        );
        let supply = SupplyGenerator::new(config.new_dwellings_per_year);
        let engine = ClearingEngine::new(
            config.max_iterations,
            config.choice_set_size,
            config.max_bedrooms,
        );
        Ok(Simulation {
            store,
            config,
            pricing,
            participation,
            bidding: BidModel::new(),
            supply,
            engine,
            shutdown: Arc::new(AtomicBool::new(false)),
            summaries: Vec::new(),
        })
    }

    pub fn store(&self) -> &SimStore {
        &self.store
    }

    pub fn summaries(&self) -> &[YearlySummary] {
        &self.summaries
    }

    /// A flag that stops the run at the next month boundary.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Runs the configured number of years.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPopulation` when a year starts with no dwellings
    /// or no persons.
    pub fn run(&mut self) -> Result<()> {
        let progress = ProgressBar::new(u64::from(self.config.years));
        for offset in 0..self.config.years {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }
            let year = self.config.start.year() + offset as i32;
            self.run_year(year)?;
            progress.inc(1);
        }
        progress.finish_and_clear();
        Ok(())
    }

    fn run_year(&mut self, year: i32) -> Result<()> {
        if self.store.dwellings().is_empty() {
            return Err(SimError::EmptyPopulation(format!(
                "no dwellings at start of year {}",
                year
            )));
        }
        if self.store.persons().is_empty() {
            return Err(SimError::EmptyPopulation(format!(
                "no persons at start of year {}",
                year
            )));
        }

        // supply draws from a stream distinct from all twelve ticks
        let mut supply_rng = Substream::new(month_seed(year, 12, self.config.random_seed));
        self.supply
            .yearly_supply(&mut self.store, year, &mut supply_rng)?;

        let mut sold = 0u32;
        let mut value = 0.0f64;
        let mut last = MonthOutcome::default();
        for month in 0..12u32 {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }
            match self.run_month(year, month) {
                Ok(outcome) => {
                    sold += outcome.sales;
                    value += outcome.total_value;
                    last = outcome;
                }
                Err(err) => {
                    error!(
                        module = "housing-market",
                        kind = err.kind(),
                        year,
                        month,
                        "monthly tick aborted: {}",
                        err
                    );
                }
            }
        }

        let summary = YearlySummary {
            year,
            dwellings_sold: sold,
            households_remaining: last.buyers_remaining,
            dwellings_remaining: last.sellers_remaining,
            average_sale_price: if sold > 0 {
                (value / f64::from(sold)) as f32
            } else {
                0.0
            },
            average_personal_income: average_personal_income(&self.store)?,
        };
        info!("{}", summary);
        self.summaries.push(summary);
        Ok(())
    }

    fn run_month(&mut self, year: i32, month: u32) -> Result<MonthOutcome> {
        let date = Date::new(year, month);
        self.store.advance_to(date);
        let mut rng = Substream::new(month_seed(year, month, self.config.random_seed));

        self.pricing.monthly_update(&self.store)?;

        let elapsed = (date - self.config.start).max(0) as usize;
        let change = self
            .config
            .birth_rate_change
            .get(elapsed)
            .copied()
            .unwrap_or(0.0);
        self.participation.set_change_in_bir(change);

        self.engine.clear_month(
            &mut self.store,
            &self.participation,
            &self.pricing,
            &mut self.bidding,
            &mut rng,
        )
    }
}

fn month_seed(year: i32, month: u32, random_seed: u32) -> u64 {
    (i64::from(year) * i64::from(random_seed) + i64::from(month)) as u64
}
