/// Bids, listings and the category board.
pub mod bid;
/// Choice-set construction (phase 1 of the monthly clear).
pub mod choiceset;
/// The iterative auction engine.
pub mod clearing;
/// Capability seams the engine is composed from.
pub mod traits;
