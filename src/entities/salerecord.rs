use super::dwelling::DwellingType;
use crate::core::traits::Identifiable;
use crate::time::date::Date;
use serde::{Deserialize, Serialize};

/// # SaleRecord
/// One completed sale, append-only and insertion-ordered. The record
/// stream feeds the next months' hedonic refits and is the primary
/// exportable artifact; field order is fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    id: Option<u64>,
    pub date: Date,
    pub price: f32,
    pub rooms: i32,
    pub square_footage: f32,
    pub zone: i32,
    pub dist_subway: f32,
    pub dist_regional: f32,
    pub residential: f32,
    pub commerce: f32,
    pub dwelling_type: DwellingType,
}

impl SaleRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: Date,
        price: f32,
        rooms: i32,
        square_footage: f32,
        zone: i32,
        dist_subway: f32,
        dist_regional: f32,
        residential: f32,
        commerce: f32,
        dwelling_type: DwellingType,
    ) -> SaleRecord {
        SaleRecord {
            id: None,
            date,
            price,
            rooms,
            square_footage,
            zone,
            dist_subway,
            dist_regional,
            residential,
            commerce,
            dwelling_type,
        }
    }
}

impl Identifiable for SaleRecord {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}
