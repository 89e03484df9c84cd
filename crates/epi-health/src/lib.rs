//! `epi-health` — per-agent infection state machines for `rust_epi`.
//!
//! Everything that happens *inside* one agent lives here: the packed
//! per-condition state bitsets, the active [`infection::Infection`]
//! course with its milestone dates, the [`trajectory::Trajectory`]
//! curves those dates derive from, and the [`condition::Condition`]
//! descriptors that parameterize them.  The crate knows nothing about
//! the agent store or the day loop; it talks to them through the
//! traits in [`groups`].
//!
//! | Module         | Contents                                          |
//! |----------------|---------------------------------------------------|
//! | [`age_map`]    | `AgeMap` piecewise age-to-value bands             |
//! | [`condition`]  | `Condition` trait, `ParamCondition`, `ConditionSet` |
//! | [`trajectory`] | `Trajectory`, `TrajectoryPoint` daily curves      |
//! | [`infection`]  | `Infection` milestone engine, period modification |
//! | [`health`]     | `Health` record, `CondBits`, daily transitions    |
//! | [`groups`]     | `MixingGroupBoard`, `LifecycleHost`, `HealthContext` |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                  |
//! |---------|---------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` where it makes sense.    |

pub mod age_map;
pub mod condition;
pub mod groups;
pub mod health;
pub mod infection;
pub mod trajectory;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use age_map::AgeMap;
pub use condition::{Condition, ConditionParams, ConditionSet, ImmunityLoss, ParamCondition};
pub use groups::{GroupTally, HealthContext, LifecycleHost, MixingGroupBoard, SharedGroupBoard};
pub use health::{CondBits, ExposureOutcome, Health, HealthEvent};
pub use infection::{Infection, InfectionError, InfectionUpdate, TransitionEvent};
pub use trajectory::{Trajectory, TrajectoryPoint};
