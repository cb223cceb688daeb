use crate::core::traits::Identifiable;
use crate::currencies::money::Money;
use crate::time::date::Date;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabourForceStatus {
    Employed,
    Unemployed,
    NotApplicable,
}

/// A job held by a person. Jobs live inline on their owner in start-date
/// order; the owning person is the implicit back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub start_date: Date,
    pub salary: Money,
}

impl Job {
    pub fn new(start_date: Date, salary: Money) -> Job {
        Job { start_date, salary }
    }
}

/// # Person
/// A simulated individual. Family membership is an ID back-reference
/// resolved through the simulation store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    id: Option<u64>,
    pub age: i32,
    pub sex: Sex,
    pub living: bool,
    pub labour_force_status: LabourForceStatus,
    pub jobs: Vec<Job>,
    pub family: Option<u64>,
}

impl Person {
    pub fn new(age: i32, sex: Sex) -> Person {
        Person {
            id: None,
            age,
            sex,
            living: true,
            labour_force_status: LabourForceStatus::NotApplicable,
            jobs: Vec::new(),
            family: None,
        }
    }

    pub fn with_job(mut self, job: Job) -> Person {
        self.labour_force_status = LabourForceStatus::Employed;
        self.jobs.push(job);
        self
    }

    pub fn has_job(&self) -> bool {
        !self.jobs.is_empty()
    }
}

impl Identifiable for Person {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}
