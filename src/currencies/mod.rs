/// Inflation-indexed conversion of dated amounts.
pub mod inflationstore;
/// Dated monetary amounts.
pub mod money;
