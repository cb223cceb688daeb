use std::collections::HashMap;

use rayon::prelude::*;

use crate::core::store::SimStore;
use crate::core::traits::Identifiable;
use crate::entities::dwelling::Dwelling;
use crate::entities::household::Household;
use crate::market::bid::Buyer;
use crate::market::traits::WillingnessToPay;
use crate::utils::errors::{Result, SimError};

/// Household income never counts below this floor.
pub const INCOME_FLOOR: f32 = 10_000.0;

/// # BidModel
/// Derives a willingness-to-pay from household income, savings and the
/// seller zone's land-use profile. The monthly warm-up caches each
/// buyer's purchasing power so the parallel bidding phase only reads.
#[derive(Default)]
pub struct BidModel {
    purchasing_power: HashMap<u64, f32>,
}

impl BidModel {
    pub fn new() -> BidModel {
        BidModel {
            purchasing_power: HashMap::new(),
        }
    }

    /// `max(income, savings)` for one household, income floored at
    /// [`INCOME_FLOOR`].
    pub fn purchasing_power(store: &SimStore, household: &Household) -> Result<f32> {
        let id = household.id().ok_or_else(|| {
            SimError::Fatal("household without an id in bid generation".to_string())
        })?;
        let income = store
            .household_income(id, store.current_date())?
            .max(INCOME_FLOOR);
        let mut savings = 0.0f32;
        for &family_id in &household.families {
            savings += store.families().get(family_id)?.liquid_assets.amount;
        }
        Ok(income.max(savings))
    }

    fn cached_power(&self, store: &SimStore, buyer: &Household) -> Result<f32> {
        if let Some(id) = buyer.id() {
            if let Some(&power) = self.purchasing_power.get(&id) {
                return Ok(power);
            }
        }
        BidModel::purchasing_power(store, buyer)
    }
}

impl WillingnessToPay for BidModel {
    fn warm_up(&mut self, store: &SimStore, buyers: &[Buyer]) -> Result<()> {
        self.purchasing_power = buyers
            .par_iter()
            .map(|buyer| {
                let household = store.households().get(buyer.household)?;
                Ok((buyer.household, BidModel::purchasing_power(store, household)?))
            })
            .collect::<Result<HashMap<u64, f32>>>()?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `MissingZoneData` when the seller's zone has no land-use
    /// row; a bid without land-use context is unsafe.
    fn bid(
        &self,
        store: &SimStore,
        buyer: &Household,
        dwelling: &Dwelling,
        asking_price: f32,
    ) -> Result<f32> {
        let power = self.cached_power(store, buyer)?;

        let current_rooms = match buyer.dwelling {
            Some(dwelling_id) => store.dwellings().get(dwelling_id)?.rooms,
            None => 0,
        };
        let delta_rooms = dwelling.rooms - current_rooms;

        let land_use = store.land_use(dwelling.zone).ok_or_else(|| {
            SimError::MissingZoneData(format!(
                "no land use for zone {} while bidding",
                dwelling.zone
            ))
        })?;
        let open_bonus = if land_use.open > 0.0 {
            5_000.0 * land_use.open.ln()
        } else {
            0.0
        };
        let industrial_penalty = if land_use.industrial > 0.0 {
            8_000.0 * land_use.industrial.ln()
        } else {
            0.0
        };

        let base = 4.0 * power;
        let space_value = 10_000.0 * delta_rooms as f32;
        let bid = (asking_price * 0.97).min(base + space_value + open_bonus - industrial_penalty);
        Ok(bid.max(power))
    }
}
