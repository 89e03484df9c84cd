//! `epi-sim` — day loop orchestrator for the rust_epi framework.
//!
//! # Daily pass order
//!
//! ```text
//! for day in 0..config.days:
//!   ① Births  — demographics model queues mothers; newborns admitted
//!               serially (recycled slots, fresh PersonIds).
//!   ② Deaths  — background mortality enqueued, then drained serially.
//!   ③ Health  — masked bulk pass over agents with active infections
//!               (parallel with the `parallel` feature); case
//!               fatalities drain serially right after.
//!   ④ Travel  — travel model updates.
//!   ⑤ Behavior — behavior model updates.
//! ```
//!
//! Every pass sees the completed effects of the passes before it and
//! none of the effects of those after it.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the health pass on Rayon's thread pool.           |
//! | `serde`    | Propagates serde derives to re-exported types.         |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use epi_core::SimConfig;
//! use epi_sim::{load_population_file, NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(config, conditions).build()?;
//! load_population_file("people.csv", &mut sim.population)?;
//! sim.seed_infection(flu, AgentId(0), 2)?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod loader;
pub mod models;
pub mod observer;
pub mod person;
pub mod population;
pub mod sim;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use loader::{load_population_file, load_population_reader};
pub use models::{
    BehaviorModel, DemographicsModel, NoopBehavior, NoopDemographics, NoopTravel, TravelModel,
};
pub use observer::{DayStats, NoopObserver, SimObserver, StatsCollector};
pub use person::{Person, Sex};
pub use population::{DayCounters, Masks, Population, RemovalQueue};
pub use sim::Simulation;
