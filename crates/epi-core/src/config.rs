//! Top-level simulation configuration.
//!
//! One immutable `SimConfig` is constructed at setup and passed by reference
//! wherever run parameters are needed.  There is deliberately no global
//! mutable parameter table: everything an agent's state machine needs is
//! threaded in explicitly, which keeps unit tests deterministic without
//! process-wide state.

use crate::Day;

/// Run-wide configuration, fixed before the first simulated day.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Total days to simulate.
    pub days: u32,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Worker thread count for the parallel passes.  `None` uses all
    /// logical cores.
    pub num_threads: Option<usize>,
}

impl SimConfig {
    /// The day at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_day(&self) -> Day {
        Day(self.days as i32)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            days: 0,
            seed: 0,
            num_threads: None,
        }
    }
}
