use epi_core::EpiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("population file error: {0}")]
    PopulationFile(#[from] csv::Error),

    #[error("population file field error on record {record}: {message}")]
    PopulationField { record: u64, message: String },

    #[error(transparent)]
    Core(#[from] EpiError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
