//! Simulation observer trait for progress reporting and data collection.

use epi_core::Day;

use crate::population::Population;

/// Aggregate epidemiological counts for one completed day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayStats {
    pub day: Day,
    /// Exposures that started an infection today.
    pub new_infections: u64,
    /// Symptom onsets today.
    pub new_symptomatic: u64,
    /// Agents infectious with at least one condition at end of day.
    pub current_infectious: usize,
    pub deaths: u64,
    pub births: u64,
    /// Living population at end of day.
    pub population: usize,
}

/// Callbacks invoked by [`Simulation::run`][crate::Simulation::run] at
/// day boundaries.
///
/// All methods have default no-op implementations so implementors only
/// need to override what they care about.
pub trait SimObserver {
    /// Called at the start of each day, before any pass runs.
    fn on_day_start(&mut self, _day: Day, _population: &Population) {}

    /// Called after all of a day's passes have completed.
    fn on_day_end(&mut self, _day: Day, _stats: &DayStats, _population: &Population) {}

    /// Called once after the final day completes.
    fn on_sim_end(&mut self, _final_day: Day) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call
/// `run` but don't want progress callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Collects every day's [`DayStats`] into a vector, for tests and
/// simple post-run reporting.
#[derive(Default)]
pub struct StatsCollector {
    pub days: Vec<DayStats>,
}

impl SimObserver for StatsCollector {
    fn on_day_end(&mut self, _day: Day, stats: &DayStats, _population: &Population) {
        self.days.push(*stats);
    }
}
