//! Seams between per-agent health state and the rest of the simulator.
//!
//! The health pass runs agents in parallel, so the side effects a
//! transition needs outside its own record (group tallies, deferred
//! removals) go through `&self` trait objects that synchronize
//! internally.

use std::sync::Mutex;

use epi_core::{AgentId, ConditionId, Day, GroupId};
use rustc_hash::FxHashMap;

use crate::condition::ConditionSet;

// ── Group tallies ─────────────────────────────────────────────────────────────

/// Daily per-group, per-condition counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GroupTally {
    /// Exposures that took place in this group today.
    pub new_infections: u32,
    /// Symptom onsets among residents today.
    pub new_symptomatic: u32,
    pub infectious: u32,
    pub symptomatic: u32,
    pub fatalities: u32,
}

/// Sink for the per-group counts a mixing group accumulates each day.
///
/// Methods take `&self`: implementations are called from the parallel
/// health pass and must synchronize internally.
pub trait MixingGroupBoard: Send + Sync {
    /// An exposure landed in `group` today.
    fn record_new_infection(&self, group: GroupId, condition: ConditionId);
    /// A resident of `group` developed symptoms today.
    fn record_new_symptomatic(&self, group: GroupId, condition: ConditionId);
    fn record_infectious(&self, group: GroupId, condition: ConditionId);
    fn record_symptomatic(&self, group: GroupId, condition: ConditionId);
    /// A resident of `group` died of `condition`.
    fn record_fatality(&self, group: GroupId, condition: ConditionId);
    /// Clears all tallies; called serially between days.
    fn reset(&self);
}

/// Mutex-guarded tally map, adequate for the default transmission
/// models.  Per-place sharding can replace it behind the same trait.
#[derive(Debug, Default)]
pub struct SharedGroupBoard {
    tallies: Mutex<FxHashMap<(GroupId, ConditionId), GroupTally>>,
}

impl SharedGroupBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tally(&self, group: GroupId, condition: ConditionId) -> GroupTally {
        self.tallies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(group, condition))
            .copied()
            .unwrap_or_default()
    }

    fn bump(&self, group: GroupId, condition: ConditionId, f: impl FnOnce(&mut GroupTally)) {
        f(self
            .tallies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry((group, condition))
            .or_default());
    }
}

impl MixingGroupBoard for SharedGroupBoard {
    fn record_new_infection(&self, group: GroupId, condition: ConditionId) {
        self.bump(group, condition, |t| t.new_infections += 1);
    }

    fn record_new_symptomatic(&self, group: GroupId, condition: ConditionId) {
        self.bump(group, condition, |t| t.new_symptomatic += 1);
    }

    fn record_infectious(&self, group: GroupId, condition: ConditionId) {
        self.bump(group, condition, |t| t.infectious += 1);
    }

    fn record_symptomatic(&self, group: GroupId, condition: ConditionId) {
        self.bump(group, condition, |t| t.symptomatic += 1);
    }

    fn record_fatality(&self, group: GroupId, condition: ConditionId) {
        self.bump(group, condition, |t| t.fatalities += 1);
    }

    fn reset(&self) {
        self.tallies.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

// ── Lifecycle host ────────────────────────────────────────────────────────────

/// Receiver for deferred lifecycle requests raised during the health
/// pass.  A fatal transition enqueues the agent here; the store frees
/// the slot serially after the pass drains the queue.
pub trait LifecycleHost: Send + Sync {
    fn enqueue_for_removal(&self, day: Day, agent: AgentId);
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Everything a health transition may touch outside the agent record.
pub struct HealthContext<'a> {
    pub conditions: &'a ConditionSet,
    pub groups: &'a dyn MixingGroupBoard,
    pub host: &'a dyn LifecycleHost,
}
