use std::collections::HashMap;

use crate::core::store::SimStore;
use crate::entities::dwelling::{Dwelling, DwellingType};
use crate::entities::salerecord::SaleRecord;
use crate::market::traits::AskingPrices;
use crate::math::cholesky::{add_outer_product, add_scaled_vector, solve_ridge};
use crate::utils::errors::{Result, SimError};
use tracing::{info, warn};

/// Length of the hedonic feature vector:
/// `(1, rooms, sqft, dist_subway, dist_regional, residential, commercial)`.
pub const FEATURES: usize = 7;

// Sales further back than this do not enter a refit.
const SALE_WINDOW_MONTHS: i32 = 3;

// Seed coefficients used for every dwelling type until its first
// successful refit.
const SEED_BETA: [f64; FEATURES] = [45_000.0, 9_000.0, 42.5, -1_200.0, -650.0, 18_000.0, 12_500.0];

/// # HedonicPriceModel
/// Per-dwelling-type hedonic coefficients, refit monthly from the
/// recent sale window, plus a per-zone average-value cache rebuilt on
/// every tick.
///
/// ## Details
/// - A failed refit keeps the previous coefficients for that type.
/// - Asking prices decay multiplicatively per month on the market.
/// - The zone average backs the ask when the linear model produces a
///   non-positive raw price.
pub struct HedonicPriceModel {
    coefficients: [[f64; FEATURES]; DwellingType::COUNT],
    zone_average_value: HashMap<i32, f32>,
    decay: f64,
}

impl HedonicPriceModel {
    pub fn new(decay: f64) -> HedonicPriceModel {
        HedonicPriceModel {
            coefficients: [SEED_BETA; DwellingType::COUNT],
            zone_average_value: HashMap::new(),
            decay,
        }
    }

    pub fn coefficients(&self, dwelling_type: DwellingType) -> &[f64; FEATURES] {
        &self.coefficients[dwelling_type.index()]
    }

    pub fn set_coefficients(&mut self, dwelling_type: DwellingType, beta: [f64; FEATURES]) {
        self.coefficients[dwelling_type.index()] = beta;
    }

    pub fn average_zone_value(&self, zone: i32) -> Option<f32> {
        self.zone_average_value.get(&zone).copied()
    }

    /// The monthly tick: rebuilds the zone-value cache, refits each
    /// dwelling type from the recent sale window and dumps the
    /// coefficient table at quarter ends.
    ///
    /// # Errors
    ///
    /// Propagates `MissingRate` from value conversion. A
    /// non-positive-definite refit is not an error; the previous
    /// coefficients stay in place.
    pub fn monthly_update(&mut self, store: &SimStore) -> Result<()> {
        let now = store.current_date();

        self.zone_average_value.clear();
        let mut sums: HashMap<i32, (f64, u32)> = HashMap::new();
        for dwelling in store.dwellings().iter() {
            if !dwelling.exists {
                continue;
            }
            let value = store.inflation().convert(dwelling.value, now)?;
            let entry = sums.entry(dwelling.zone).or_insert((0.0, 0));
            entry.0 += f64::from(value.amount);
            entry.1 += 1;
        }
        for (zone, (total, count)) in sums {
            self.zone_average_value
                .insert(zone, (total / f64::from(count)) as f32);
        }

        self.refit(store, now.month_index());

        if now.is_quarter_end() {
            for dwelling_type in DwellingType::ALL {
                info!(
                    month = %now,
                    kind = ?dwelling_type,
                    beta = ?self.coefficients[dwelling_type.index()],
                    "hedonic coefficients"
                );
            }
        }
        Ok(())
    }

    fn refit(&mut self, store: &SimStore, now_index: i32) {
        let window: Vec<&SaleRecord> = store
            .sale_records()
            .iter()
            .filter(|record| {
                let index = record.date.month_index();
                index >= now_index - SALE_WINDOW_MONTHS && index < now_index
            })
            .collect();
        if window.is_empty() {
            return;
        }

        for dwelling_type in DwellingType::ALL {
            let mut xtx = vec![0.0; FEATURES * FEATURES];
            let mut xty = vec![0.0; FEATURES];
            let mut observations = 0u32;
            for record in &window {
                if record.dwelling_type != dwelling_type {
                    continue;
                }
                let x = record_features(record);
                add_outer_product(&mut xtx, &x, 1.0);
                add_scaled_vector(&mut xty, &x, f64::from(record.price));
                observations += 1;
            }
            if observations == 0 {
                continue;
            }
            match solve_ridge(&xtx, &xty, FEATURES) {
                Ok(beta) => {
                    let slot = &mut self.coefficients[dwelling_type.index()];
                    slot.copy_from_slice(&beta);
                }
                Err(SimError::NotPositiveDefinite(detail)) => {
                    warn!(
                        kind = ?dwelling_type,
                        observations,
                        "hedonic refit rejected, keeping previous coefficients: {}",
                        detail
                    );
                }
                Err(err) => {
                    warn!(kind = ?dwelling_type, "hedonic refit failed: {}", err);
                }
            }
        }
    }

    fn dwelling_features(&self, store: &SimStore, dwelling: &Dwelling) -> [f64; FEATURES] {
        let land_use = store.land_use(dwelling.zone).unwrap_or_default();
        [
            1.0,
            f64::from(dwelling.rooms),
            f64::from(dwelling.square_footage),
            f64::from(store.subway_distance(dwelling.zone).unwrap_or(0.0)),
            f64::from(store.regional_distance(dwelling.zone).unwrap_or(0.0)),
            f64::from(land_use.residential),
            f64::from(land_use.commercial),
        ]
    }
}

impl AskingPrices for HedonicPriceModel {
    /// `(ask, min_bid)` for one dwelling. The minimum is zero; the
    /// market engine's minimum-price field is the enforcement point.
    fn price(&self, store: &SimStore, dwelling: &Dwelling) -> (f32, f32) {
        let beta = &self.coefficients[dwelling.dwelling_type.index()];
        let x = self.dwelling_features(store, dwelling);
        let mut raw: f64 = beta.iter().zip(&x).map(|(b, f)| b * f).sum();
        if raw <= 0.0 {
            if let Some(average) = self.average_zone_value(dwelling.zone) {
                raw = f64::from(average);
            }
        }
        let months = dwelling.months_on_market(store.current_date());
        let ask = raw * self.decay.powi(months);
        (ask as f32, 0.0)
    }
}

fn record_features(record: &SaleRecord) -> [f64; FEATURES] {
    [
        1.0,
        f64::from(record.rooms),
        f64::from(record.square_footage),
        f64::from(record.dist_subway),
        f64::from(record.dist_regional),
        f64::from(record.residential),
        f64::from(record.commerce),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currencies::money::Money;
    use crate::time::date::Date;

    fn dwelling(rooms: i32, sqft: f32, zone: i32) -> Dwelling {
        Dwelling::new(
            DwellingType::Detached,
            rooms,
            sqft,
            zone,
            Money::new(150_000.0, Date::new(2006, 0)),
        )
    }

    fn store_at(date: Date) -> SimStore {
        let mut store = SimStore::new(date);
        store.advance_to(date);
        store
    }

    #[test]
    fn test_seed_coefficients_before_first_refit() {
        let model = HedonicPriceModel::new(0.95);
        assert_eq!(model.coefficients(DwellingType::Attached), &SEED_BETA);
    }

    #[test]
    fn test_price_uses_linear_model_and_zone_lookups() {
        let store = store_at(Date::new(2006, 5));
        let mut model = HedonicPriceModel::new(0.95);
        model.set_coefficients(
            DwellingType::Detached,
            [1000.0, 10.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        );
        let (ask, min_bid) = model.price(&store, &dwelling(3, 970.0, 0));
        assert!((ask - 2000.0).abs() < 1e-3);
        assert_eq!(min_bid, 0.0);
    }

    #[test]
    fn test_time_on_market_decay() {
        let store = store_at(Date::new(2006, 5));
        let mut model = HedonicPriceModel::new(0.95);
        model.set_coefficients(
            DwellingType::Detached,
            [300_000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        );
        let mut d = dwelling(3, 900.0, 0);
        d.listing_date = Some(Date::new(2006, 2));
        let (ask, _) = model.price(&store, &d);
        assert!((f64::from(ask) - 300_000.0 * 0.857_375).abs() < 1.0);
    }

    #[test]
    fn test_refit_recovers_linear_relationship() {
        let mut store = store_at(Date::new(2006, 3));
        // price = 1000 + 500·rooms, constant elsewhere
        for rooms in 1..=6 {
            store.sale_records_mut().add_new(SaleRecord::new(
                Date::new(2006, 2),
                1000.0 + 500.0 * rooms as f32,
                rooms,
                0.0,
                0,
                0.0,
                0.0,
                0.0,
                0.0,
                DwellingType::Detached,
            ));
        }
        let mut model = HedonicPriceModel::new(1.0);
        model.monthly_update(&store).unwrap();
        let beta = model.coefficients(DwellingType::Detached);
        assert!((beta[0] - 1000.0).abs() < 10.0);
        assert!((beta[1] - 500.0).abs() < 5.0);
        // other types never saw a sale and keep their seed
        assert_eq!(model.coefficients(DwellingType::ApartmentHigh), &SEED_BETA);
    }

    #[test]
    fn test_empty_window_keeps_previous_coefficients() {
        let mut store = store_at(Date::new(2006, 6));
        // a record outside the three-month window
        store.sale_records_mut().add_new(SaleRecord::new(
            Date::new(2006, 0),
            99_999.0,
            3,
            900.0,
            0,
            0.0,
            0.0,
            0.0,
            0.0,
            DwellingType::Detached,
        ));
        let mut model = HedonicPriceModel::new(0.95);
        model.monthly_update(&store).unwrap();
        assert_eq!(model.coefficients(DwellingType::Detached), &SEED_BETA);
    }

    #[test]
    fn test_zone_average_cache() {
        let mut store = store_at(Date::new(2006, 4));
        store.dwellings_mut().add_new(dwelling(3, 900.0, 1));
        let mut second = dwelling(4, 1200.0, 1);
        second.value = Money::new(250_000.0, Date::new(2006, 0));
        store.dwellings_mut().add_new(second);
        let mut model = HedonicPriceModel::new(0.95);
        model.monthly_update(&store).unwrap();
        assert!((model.average_zone_value(1).unwrap() - 200_000.0).abs() < 1.0);
        assert!(model.average_zone_value(2).is_none());
    }
}
