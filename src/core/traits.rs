use crate::time::date::Date;

/// # Identifiable
/// A trait for entities that receive a stable ID on insertion into a
/// repository. An entity's ID is `None` until it is added and never
/// changes afterwards.
pub trait Identifiable {
    fn id(&self) -> Option<u64>;
    fn assign_id(&mut self, id: u64);
}

pub trait HasReferenceDate {
    fn reference_date(&self) -> Date;
}
