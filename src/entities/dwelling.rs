use crate::core::traits::Identifiable;
use crate::currencies::money::Money;
use crate::time::date::Date;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DwellingType {
    Detached,
    SemiDetached,
    Attached,
    ApartmentLow,
    ApartmentHigh,
}

impl DwellingType {
    pub const COUNT: usize = 5;

    pub const ALL: [DwellingType; DwellingType::COUNT] = [
        DwellingType::Detached,
        DwellingType::SemiDetached,
        DwellingType::Attached,
        DwellingType::ApartmentLow,
        DwellingType::ApartmentHigh,
    ];

    pub fn index(self) -> usize {
        match self {
            DwellingType::Detached => 0,
            DwellingType::SemiDetached => 1,
            DwellingType::Attached => 2,
            DwellingType::ApartmentLow => 3,
            DwellingType::ApartmentHigh => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<DwellingType> {
        DwellingType::ALL.get(index).copied()
    }
}

/// # Dwelling
/// A unit of housing stock. The occupant link mirrors
/// `Household::dwelling`. A dwelling with a listing date is on the
/// market; unsold dwellings keep their listing date across months and a
/// sale resets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dwelling {
    id: Option<u64>,
    pub exists: bool,
    pub dwelling_type: DwellingType,
    pub rooms: i32,
    pub square_footage: f32,
    pub zone: i32,
    pub value: Money,
    pub household: Option<u64>,
    pub listing_date: Option<Date>,
}

impl Dwelling {
    pub fn new(
        dwelling_type: DwellingType,
        rooms: i32,
        square_footage: f32,
        zone: i32,
        value: Money,
    ) -> Dwelling {
        Dwelling {
            id: None,
            exists: true,
            dwelling_type,
            rooms,
            square_footage,
            zone,
            value,
            household: None,
            listing_date: None,
        }
    }

    pub fn is_vacant(&self) -> bool {
        self.household.is_none()
    }

    pub fn is_listed(&self) -> bool {
        self.listing_date.is_some()
    }

    /// Whole months this dwelling has been on the market as of `now`;
    /// zero when unlisted or listed in the future.
    pub fn months_on_market(&self, now: Date) -> i32 {
        match self.listing_date {
            Some(listed) => (now - listed).max(0),
            None => 0,
        }
    }
}

impl Identifiable for Dwelling {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}
