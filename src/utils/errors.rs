use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(String),
    #[error("Missing zone data: {0}")]
    MissingZoneData(String),
    #[error("Missing inflation rate: {0}")]
    MissingRate(String),
    #[error("Matrix not positive definite: {0}")]
    NotPositiveDefinite(String),
    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),
    #[error("Empty population: {0}")]
    EmptyPopulation(String),
    #[error("Fatal: {0}")]
    Fatal(String),
}

impl SimError {
    /// Short tag used by the scheduler's single-line failure report.
    pub fn kind(&self) -> &'static str {
        match self {
            SimError::ConfigMissing(_) => "ConfigMissing",
            SimError::MissingZoneData(_) => "MissingZoneData",
            SimError::MissingRate(_) => "MissingRate",
            SimError::NotPositiveDefinite(_) => "NotPositiveDefinite",
            SimError::IndexOutOfRange(_) => "IndexOutOfRange",
            SimError::EmptyPopulation(_) => "EmptyPopulation",
            SimError::Fatal(_) => "Fatal",
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
