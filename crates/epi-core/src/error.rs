//! Framework error type.
//!
//! Sub-crates define their own error enums for recoverable domain-rule
//! violations (e.g. `InfectionError` in `epi-health`) and either convert
//! into `EpiError` via `From` or wrap it as one variant.
//!
//! Invariant violations — double exposure, operating on an out-of-range
//! condition index, freeing an already-free slot — are *not* errors: they
//! panic with a diagnostic naming the agent, condition, and day, and the
//! whole run is the unit of failure.

use thiserror::Error;

use crate::AgentId;

/// The top-level error type for `epi-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum EpiError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("stale handle for agent {id}: handle generation {held}, slot generation {current}")]
    StaleHandle {
        id: AgentId,
        held: u32,
        current: u32,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `epi-*` crates.
pub type EpiResult<T> = Result<T, EpiError>;
