/// Cholesky solver for small ridge-regularised normal equations.
pub mod cholesky;
/// Inverse standard-normal sampling.
pub mod normal;
/// Deterministic per-worker random substreams.
pub mod random;
