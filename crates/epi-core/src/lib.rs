//! `epi-core` — foundational types for the `rust_epi` epidemic framework.
//!
//! This crate is a dependency of every other `epi-*` crate.  It intentionally
//! has no `epi-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                              |
//! |------------|-------------------------------------------------------|
//! | [`ids`]    | `AgentId`, `PersonId`, `ConditionId`, `GroupId`       |
//! | [`time`]   | `Day` — the integer simulated-day time model          |
//! | [`rng`]    | `AgentRng` (per-agent), `SimRng` (global)             |
//! | [`config`] | `SimConfig` immutable run configuration               |
//! | [`error`]  | `EpiError`, `EpiResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                  |
//! |---------|---------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.     |

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::SimConfig;
pub use error::{EpiError, EpiResult};
pub use ids::{AgentId, ConditionId, GroupId, PersonId};
pub use rng::{AgentRng, SimRng};
pub use time::Day;
