use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::store::SimStore;
use crate::core::traits::Identifiable;
use crate::entities::household::Household;
use crate::market::bid::Buyer;
use crate::market::traits::BuyerSource;
use crate::math::random::Substream;
use crate::utils::errors::Result;

// Constant term of the opt-in utility.
const UTILITY_CONSTANT: f64 = -0.084;

// Monthly probability of each household event flag.
const EVENT_PROBABILITY: f64 = 0.01;

/// A random coefficient: `mean + sd · gauss()` when `sd` is nonzero,
/// otherwise just the mean (no draw is consumed).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoefficientDraw {
    pub mean: f64,
    pub sd: f64,
}

impl CoefficientDraw {
    pub fn new(mean: f64, sd: f64) -> CoefficientDraw {
        CoefficientDraw { mean, sd }
    }

    fn sample(&self, rng: &mut Substream) -> f64 {
        if self.sd != 0.0 {
            self.mean + self.sd * rng.gauss()
        } else {
            self.mean
        }
    }
}

/// # ParticipationCoefficients
/// The calibration table of the opt-in logit. One entry per observable;
/// flag entries contribute when the flag is set, continuous entries are
/// multiplied by their covariate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParticipationCoefficients {
    pub job_increase: CoefficientDraw,
    pub job_decrease: CoefficientDraw,
    pub retirement: CoefficientDraw,
    pub job_change: CoefficientDraw,
    pub new_child: CoefficientDraw,
    pub head_age: CoefficientDraw,
    pub change_in_bir: CoefficientDraw,
    pub years_in_dwelling: CoefficientDraw,
    pub num_jobs: CoefficientDraw,
    pub non_mover: CoefficientDraw,
    pub labour_force_participation: CoefficientDraw,
}

impl Default for ParticipationCoefficients {
    fn default() -> ParticipationCoefficients {
        ParticipationCoefficients {
            job_increase: CoefficientDraw::new(0.32, 0.05),
            job_decrease: CoefficientDraw::new(0.46, 0.08),
            retirement: CoefficientDraw::new(0.21, 0.0),
            job_change: CoefficientDraw::new(0.39, 0.06),
            new_child: CoefficientDraw::new(0.55, 0.10),
            head_age: CoefficientDraw::new(-0.012, 0.0),
            change_in_bir: CoefficientDraw::new(0.8, 0.0),
            years_in_dwelling: CoefficientDraw::new(-0.035, 0.005),
            num_jobs: CoefficientDraw::new(0.06, 0.0),
            non_mover: CoefficientDraw::new(-2.2, 0.0),
            labour_force_participation: CoefficientDraw::new(0.45, 0.0),
        }
    }
}

/// # ParticipationModel
/// Decides which owner-occupier households enter the market each month
/// via a logit over household events and observables. Accepted
/// households become buyers; their demand counter decides whether they
/// search one room size up instead of down.
pub struct ParticipationModel {
    coefficients: ParticipationCoefficients,
    labour_force_participation: f64,
    non_mover_ratio: f64,
    change_in_bir: f64,
}

impl ParticipationModel {
    pub fn new(
        coefficients: ParticipationCoefficients,
        labour_force_participation: f64,
        non_mover_ratio: f64,
    ) -> ParticipationModel {
        ParticipationModel {
            coefficients,
            labour_force_participation,
            non_mover_ratio,
            change_in_bir: 0.0,
        }
    }

    /// Supplies this month's birth-rate-change covariate; zero when no
    /// collaborator series is configured.
    pub fn set_change_in_bir(&mut self, change: f64) {
        self.change_in_bir = change;
    }

    /// Runs the opt-in test for one household. `None` means the
    /// household sits this month out.
    pub fn evaluate(
        &self,
        store: &SimStore,
        household: &Household,
        rng: &mut Substream,
    ) -> Result<Option<Buyer>> {
        let now = store.current_date();
        let c = &self.coefficients;

        let job_increase = rng.bernoulli(EVENT_PROBABILITY);
        let job_decrease = rng.bernoulli(EVENT_PROBABILITY);
        let retirement = rng.bernoulli(EVENT_PROBABILITY);
        let job_change = rng.bernoulli(EVENT_PROBABILITY);

        let mut new_child = false;
        let mut head_age = 0i32;
        let mut num_jobs = 0i32;
        let mut persons = 0i32;
        for &family_id in &household.families {
            let family = store.families().get(family_id)?;
            for &person_id in &family.persons {
                let person = store.persons().get(person_id)?;
                persons += 1;
                new_child |= person.age <= 0;
                head_age = head_age.max(person.age);
                num_jobs += i32::from(person.has_job());
            }
        }

        let years_in_dwelling = match household.dwelling {
            Some(dwelling_id) => {
                let dwelling = store.dwellings().get(dwelling_id)?;
                f64::from((now - dwelling.value.when_created).max(0)) / 12.0
            }
            None => 0.0,
        };

        let mut utility = UTILITY_CONSTANT;
        if job_increase {
            utility += c.job_increase.sample(rng);
        }
        if job_decrease {
            utility += c.job_decrease.sample(rng);
        }
        if retirement {
            utility += c.retirement.sample(rng);
        }
        if job_change {
            utility += c.job_change.sample(rng);
        }
        if new_child {
            utility += c.new_child.sample(rng);
        }
        utility += f64::from(head_age) * c.head_age.sample(rng);
        utility += self.change_in_bir * c.change_in_bir.sample(rng);
        utility += years_in_dwelling * c.years_in_dwelling.sample(rng);
        utility += f64::from(num_jobs) * c.num_jobs.sample(rng);
        utility += self.non_mover_ratio * c.non_mover.sample(rng);
        utility += self.labour_force_participation * c.labour_force_participation.sample(rng);

        let probability = 0.5 * logistic(utility);
        if rng.uniform_f64() > probability {
            return Ok(None);
        }

        let demand = i32::from(job_increase) + i32::from(new_child) - i32::from(job_decrease);
        Ok(Some(Buyer {
            household: household.id().unwrap_or_default(),
            persons,
            demands_space: demand > 0,
        }))
    }
}

impl BuyerSource for ParticipationModel {
    fn collect_buyers(&self, store: &SimStore, rng: &mut Substream) -> Result<Vec<Buyer>> {
        // seeds drawn in repository order, evaluation in parallel
        let candidates: Vec<(u64, u64)> = store
            .households()
            .iter()
            .filter(|household| household.is_owner_occupier())
            .filter_map(|household| household.id())
            .map(|id| (id, rng.child_seed()))
            .collect();

        let selected = candidates
            .par_iter()
            .map(|&(household_id, seed)| {
                let household = store.households().get(household_id)?;
                let mut substream = Substream::new(seed);
                self.evaluate(store, household, &mut substream)
            })
            .collect::<Result<Vec<Option<Buyer>>>>()?;

        Ok(selected.into_iter().flatten().collect())
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currencies::money::Money;
    use crate::entities::dwelling::{Dwelling, DwellingType};
    use crate::entities::family::Family;
    use crate::entities::household::Tenure;
    use crate::entities::person::{Person, Sex};
    use crate::time::date::Date;

    fn populated_store(owners: usize) -> SimStore {
        let date = Date::new(2006, 5);
        let mut store = SimStore::new(date);
        for _ in 0..owners {
            let household_id = store.households_mut().add_new(Household::new(Tenure::Own));
            let mut family = Family::new(Money::new(0.0, date), Money::new(0.0, date));
            family.household = Some(household_id);
            let person_id = store.persons_mut().add_new(Person::new(40, Sex::Male));
            family.persons.push(person_id);
            let family_id = store.families_mut().add_new(family);
            let dwelling_id = store.dwellings_mut().add_new(Dwelling::new(
                DwellingType::Detached,
                3,
                900.0,
                0,
                Money::new(150_000.0, Date::new(2000, 0)),
            ));
            let household = store.households_mut().get_mut(household_id).unwrap();
            household.families.push(family_id);
            household.dwelling = Some(dwelling_id);
            store.dwellings_mut().get_mut(dwelling_id).unwrap().household =
                Some(household_id);
        }
        store
    }

    #[test]
    fn test_logistic_midpoint() {
        assert!((logistic(0.0) - 0.5).abs() < 1e-12);
        assert!(logistic(10.0) > 0.999);
        assert!(logistic(-10.0) < 0.001);
    }

    #[test]
    fn test_collect_is_deterministic() {
        let store = populated_store(200);
        let model = ParticipationModel::new(ParticipationCoefficients::default(), 0.658, 0.95);
        let first: Vec<u64> = model
            .collect_buyers(&store, &mut Substream::new(11))
            .unwrap()
            .iter()
            .map(|b| b.household)
            .collect();
        let second: Vec<u64> = model
            .collect_buyers(&store, &mut Substream::new(11))
            .unwrap()
            .iter()
            .map(|b| b.household)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_only_owner_occupiers_are_tested() {
        let mut store = populated_store(10);
        // a renter household never enters
        store.households_mut().add_new(Household::new(Tenure::Rent));
        let model = ParticipationModel::new(ParticipationCoefficients::default(), 0.658, 0.95);
        let buyers = model.collect_buyers(&store, &mut Substream::new(3)).unwrap();
        for buyer in &buyers {
            let household = store.households().get(buyer.household).unwrap();
            assert!(household.is_owner_occupier());
        }
    }

    #[test]
    fn test_participation_rate_is_plausible() {
        let store = populated_store(2000);
        let model = ParticipationModel::new(ParticipationCoefficients::default(), 0.658, 0.95);
        let buyers = model.collect_buyers(&store, &mut Substream::new(5)).unwrap();
        let rate = buyers.len() as f64 / 2000.0;
        // 0.5·logistic(U) caps the monthly rate at one half
        assert!(rate < 0.5);
        assert!(rate > 0.0);
    }

    #[test]
    fn test_buyer_carries_household_size() {
        let store = populated_store(300);
        let model = ParticipationModel::new(ParticipationCoefficients::default(), 0.658, 0.95);
        let buyers = model.collect_buyers(&store, &mut Substream::new(9)).unwrap();
        assert!(!buyers.is_empty());
        for buyer in &buyers {
            assert_eq!(buyer.persons, 1);
        }
    }
}
