use crate::core::traits::Identifiable;
use crate::currencies::money::Money;
use serde::{Deserialize, Serialize};

/// # Family
/// An ordered group of persons with shared finances. Person, head and
/// household links are ID back-references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    id: Option<u64>,
    pub persons: Vec<u64>,
    pub female_head: Option<u64>,
    pub savings: Money,
    pub liquid_assets: Money,
    pub household: Option<u64>,
}

impl Family {
    pub fn new(savings: Money, liquid_assets: Money) -> Family {
        Family {
            id: None,
            persons: Vec::new(),
            female_head: None,
            savings,
            liquid_assets,
            household: None,
        }
    }

    pub fn size(&self) -> usize {
        self.persons.len()
    }
}

impl Identifiable for Family {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}
