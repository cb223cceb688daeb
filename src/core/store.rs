use std::collections::HashMap;

use super::repository::Repository;
use super::traits::HasReferenceDate;
use crate::currencies::inflationstore::InflationStore;
use crate::entities::dwelling::Dwelling;
use crate::entities::family::Family;
use crate::entities::household::Household;
use crate::entities::person::Person;
use crate::entities::salerecord::SaleRecord;
use crate::entities::zone::{LandUse, ZoneSystem};
use crate::time::date::Date;
use crate::utils::errors::Result;

/// # SimStore
/// The simulation context: entity repositories, zone tables and the
/// inflation converter, threaded by reference to every component. There
/// are no ambient singletons; everything a component reads or mutates
/// comes through this value.
///
/// ## Parameters
/// * `reference_date` - The current simulation date, advanced monthly
/// * `persons`, `families`, `households`, `dwellings`, `sale_records` -
///   entity repositories
/// * `zone_system` - bijection between zone indices and zone numbers
/// * `land_use`, `subway_distance`, `regional_distance` - per-zone tables
///   keyed by zone number
/// * `inflation` - monthly inflation index
#[derive(Clone, Default)]
pub struct SimStore {
    reference_date: Option<Date>,
    persons: Repository<Person>,
    families: Repository<Family>,
    households: Repository<Household>,
    dwellings: Repository<Dwelling>,
    sale_records: Repository<SaleRecord>,
    zone_system: ZoneSystem,
    land_use: HashMap<i32, LandUse>,
    subway_distance: HashMap<i32, f32>,
    regional_distance: HashMap<i32, f32>,
    inflation: InflationStore,
}

impl SimStore {
    pub fn new(start: Date) -> SimStore {
        SimStore {
            reference_date: Some(start),
            ..SimStore::default()
        }
    }

    /// The current simulation date. Defaults to month zero of year zero
    /// until the scheduler advances it.
    pub fn current_date(&self) -> Date {
        self.reference_date.unwrap_or_else(|| Date::new(0, 0))
    }

    pub fn advance_to(&mut self, date: Date) {
        self.reference_date = Some(date);
    }

    pub fn persons(&self) -> &Repository<Person> {
        &self.persons
    }

    pub fn persons_mut(&mut self) -> &mut Repository<Person> {
        &mut self.persons
    }

    pub fn families(&self) -> &Repository<Family> {
        &self.families
    }

    pub fn families_mut(&mut self) -> &mut Repository<Family> {
        &mut self.families
    }

    pub fn households(&self) -> &Repository<Household> {
        &self.households
    }

    pub fn households_mut(&mut self) -> &mut Repository<Household> {
        &mut self.households
    }

    pub fn dwellings(&self) -> &Repository<Dwelling> {
        &self.dwellings
    }

    pub fn dwellings_mut(&mut self) -> &mut Repository<Dwelling> {
        &mut self.dwellings
    }

    pub fn sale_records(&self) -> &Repository<SaleRecord> {
        &self.sale_records
    }

    pub fn sale_records_mut(&mut self) -> &mut Repository<SaleRecord> {
        &mut self.sale_records
    }

    pub fn zone_system(&self) -> &ZoneSystem {
        &self.zone_system
    }

    pub fn set_zone_system(&mut self, zone_system: ZoneSystem) {
        self.zone_system = zone_system;
    }

    pub fn inflation(&self) -> &InflationStore {
        &self.inflation
    }

    pub fn inflation_mut(&mut self) -> &mut InflationStore {
        &mut self.inflation
    }

    pub fn set_land_use(&mut self, zone: i32, land_use: LandUse) {
        self.land_use.insert(zone, land_use);
    }

    pub fn land_use(&self, zone: i32) -> Option<LandUse> {
        self.land_use.get(&zone).copied()
    }

    pub fn set_subway_distance(&mut self, zone: i32, distance: f32) {
        self.subway_distance.insert(zone, distance);
    }

    pub fn subway_distance(&self, zone: i32) -> Option<f32> {
        self.subway_distance.get(&zone).copied()
    }

    pub fn set_regional_distance(&mut self, zone: i32, distance: f32) {
        self.regional_distance.insert(zone, distance);
    }

    pub fn regional_distance(&self, zone: i32) -> Option<f32> {
        self.regional_distance.get(&zone).copied()
    }

    /// Total persons across a household's families.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` when the household or one of its
    /// families is unknown.
    pub fn household_size(&self, household_id: u64) -> Result<i32> {
        let household = self.households.get(household_id)?;
        let mut count = 0;
        for &family_id in &household.families {
            count += self.families.get(family_id)?.size() as i32;
        }
        Ok(count)
    }

    /// Household income at `date`: every job salary of every person of
    /// every family, converted to `date`.
    ///
    /// # Errors
    ///
    /// Propagates `MissingRate` from conversion and `IndexOutOfRange`
    /// from dangling back-references.
    pub fn household_income(&self, household_id: u64, date: Date) -> Result<f32> {
        let household = self.households.get(household_id)?;
        let mut income = 0.0f32;
        for &family_id in &household.families {
            let family = self.families.get(family_id)?;
            for &person_id in &family.persons {
                let person = self.persons.get(person_id)?;
                for job in &person.jobs {
                    income += self.inflation.convert(job.salary, date)?.amount;
                }
            }
        }
        Ok(income)
    }
}

impl HasReferenceDate for SimStore {
    fn reference_date(&self) -> Date {
        self.current_date()
    }
}
