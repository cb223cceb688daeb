use crate::core::traits::Identifiable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tenure {
    Own,
    Rent,
    Other,
}

/// # Household
/// An ordered group of families occupying at most one dwelling. The
/// dwelling link mirrors `Dwelling::household`; the market engine is the
/// only component allowed to break that symmetry, and only within a
/// resolution call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    id: Option<u64>,
    pub families: Vec<u64>,
    pub tenure: Tenure,
    pub dwelling: Option<u64>,
}

impl Household {
    pub fn new(tenure: Tenure) -> Household {
        Household {
            id: None,
            families: Vec::new(),
            tenure,
            dwelling: None,
        }
    }

    pub fn is_owner_occupier(&self) -> bool {
        self.tenure == Tenure::Own && self.dwelling.is_some()
    }
}

impl Identifiable for Household {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}
