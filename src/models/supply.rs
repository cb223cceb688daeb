use crate::core::store::SimStore;
use crate::currencies::money::Money;
use crate::entities::dwelling::{Dwelling, DwellingType};
use crate::math::random::Substream;
use crate::time::date::Date;
use crate::utils::errors::{Result, SimError};
use tracing::debug;

// Cumulative type distribution: Detached 0.40, SemiDetached 0.20,
// Attached 0.20, ApartmentLow 0.15, ApartmentHigh 0.05.
const TYPE_THRESHOLDS: [(f32, DwellingType); 5] = [
    (0.40, DwellingType::Detached),
    (0.60, DwellingType::SemiDetached),
    (0.80, DwellingType::Attached),
    (0.95, DwellingType::ApartmentLow),
    (1.0, DwellingType::ApartmentHigh),
];

const BASE_VALUE: f32 = 87_000.0;
const VALUE_GROWTH_PER_YEAR: f32 = 50_000.0;
const BASE_YEAR: i32 = 1986;

/// # SupplyGenerator
/// Adds newly built dwellings once per year, before the year's first
/// monthly clear. New stock is vacant and unlisted; the participation
/// rules put it on the market.
pub struct SupplyGenerator {
    dwellings_per_year: u32,
}

impl SupplyGenerator {
    pub fn new(dwellings_per_year: u32) -> SupplyGenerator {
        SupplyGenerator { dwellings_per_year }
    }

    /// # Errors
    ///
    /// Returns `ConfigMissing` when the zone system is empty.
    pub fn yearly_supply(
        &self,
        store: &mut SimStore,
        year: i32,
        rng: &mut Substream,
    ) -> Result<()> {
        if self.dwellings_per_year == 0 {
            return Ok(());
        }
        if store.zone_system().is_empty() {
            return Err(SimError::ConfigMissing(
                "zone system required for dwelling supply".to_string(),
            ));
        }
        let value = Money::new(
            BASE_VALUE + VALUE_GROWTH_PER_YEAR * (year - BASE_YEAR).max(0) as f32,
            Date::new(year, 0),
        );
        for _ in 0..self.dwellings_per_year {
            let dwelling_type = draw_type(rng);
            let rooms = draw_rooms(dwelling_type, rng);
            let low = rooms as f32 * 200.0;
            let high = rooms as f32 * 400.0;
            let square_footage = low + rng.uniform() * (high - low);
            let zone_index =
                (rng.uniform_int(0, 4) as usize).min(store.zone_system().len() - 1);
            let zone = store.zone_system().zone_number(zone_index)?;
            store.dwellings_mut().add_new(Dwelling::new(
                dwelling_type,
                rooms,
                square_footage,
                zone,
                value,
            ));
        }
        debug!(
            year,
            count = self.dwellings_per_year,
            "yearly dwelling supply added"
        );
        Ok(())
    }
}

fn draw_type(rng: &mut Substream) -> DwellingType {
    let roll = rng.uniform();
    for &(threshold, dwelling_type) in &TYPE_THRESHOLDS {
        if roll < threshold {
            return dwelling_type;
        }
    }
    DwellingType::ApartmentHigh
}

fn draw_rooms(dwelling_type: DwellingType, rng: &mut Substream) -> i32 {
    let (low, high) = match dwelling_type {
        DwellingType::Detached => (4, 7),
        DwellingType::SemiDetached => (3, 6),
        DwellingType::Attached => (3, 5),
        DwellingType::ApartmentLow => (1, 4),
        DwellingType::ApartmentHigh => (1, 3),
    };
    rng.uniform_int(low, high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::zone::ZoneSystem;

    fn store() -> SimStore {
        let mut store = SimStore::new(Date::new(1990, 0));
        store.set_zone_system(ZoneSystem::new(vec![0, 1, 2, 3, 4]));
        store
    }

    #[test]
    fn test_supply_adds_vacant_unlisted_stock() {
        let mut store = store();
        let generator = SupplyGenerator::new(40);
        generator
            .yearly_supply(&mut store, 1990, &mut Substream::new(17))
            .unwrap();
        assert_eq!(store.dwellings().len(), 40);
        for dwelling in store.dwellings().iter() {
            assert!(dwelling.exists);
            assert!(dwelling.is_vacant());
            assert!(!dwelling.is_listed());
            assert!(dwelling.rooms >= 1 && dwelling.rooms <= 7);
            let low = dwelling.rooms as f32 * 200.0;
            let high = dwelling.rooms as f32 * 400.0;
            assert!(dwelling.square_footage >= low && dwelling.square_footage < high);
            assert!((0..=4).contains(&dwelling.zone));
        }
    }

    #[test]
    fn test_value_grows_after_base_year() {
        let mut store = store();
        let generator = SupplyGenerator::new(1);
        generator
            .yearly_supply(&mut store, 1990, &mut Substream::new(1))
            .unwrap();
        let dwelling = store.dwellings().iter().next().unwrap();
        assert_eq!(dwelling.value.amount, 87_000.0 + 50_000.0 * 4.0);
        assert_eq!(dwelling.value.when_created, Date::new(1990, 0));
    }

    #[test]
    fn test_value_floor_before_base_year() {
        let mut store = store();
        let generator = SupplyGenerator::new(1);
        generator
            .yearly_supply(&mut store, 1980, &mut Substream::new(1))
            .unwrap();
        let dwelling = store.dwellings().iter().next().unwrap();
        assert_eq!(dwelling.value.amount, 87_000.0);
    }

    #[test]
    fn test_type_distribution_roughly_matches() {
        let mut store = store();
        let generator = SupplyGenerator::new(4000);
        generator
            .yearly_supply(&mut store, 1995, &mut Substream::new(23))
            .unwrap();
        let detached = store
            .dwellings()
            .iter()
            .filter(|d| d.dwelling_type == DwellingType::Detached)
            .count() as f64
            / 4000.0;
        assert!((detached - 0.40).abs() < 0.05);
    }

    #[test]
    fn test_zero_supply_is_a_no_op() {
        let mut store = store();
        SupplyGenerator::new(0)
            .yearly_supply(&mut store, 1990, &mut Substream::new(2))
            .unwrap();
        assert!(store.dwellings().is_empty());
    }
}
