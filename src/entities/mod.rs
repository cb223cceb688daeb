/// Dwellings and their types.
pub mod dwelling;
/// Families.
pub mod family;
/// Households and tenure.
pub mod household;
/// Persons and jobs.
pub mod person;
/// Append-only sale records.
pub mod salerecord;
/// Zone system and per-zone attributes.
pub mod zone;
