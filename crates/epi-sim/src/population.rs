//! The population store and its bulk passes.
//!
//! [`Population`] wraps the agent arena with the epidemic-specific
//! operations the day loop needs: exposure, the (optionally parallel)
//! health pass, serial drains of the death and maternity queues, and
//! the mask bookkeeping that keeps each pass visiting only the agents
//! it concerns.
//!
//! Deaths raised *during* a parallel pass are never applied in place;
//! they land in [`RemovalQueue`] and the coordinator frees the slots
//! serially once the pass has finished.  A dying agent therefore stays
//! a valid store resident through the rest of its final day.

use std::sync::Mutex;

use epi_agent::{AgentArena, Mask, MaskLayout};
use epi_core::{AgentId, ConditionId, Day, EpiResult, GroupId, PersonId, SimRng};
use epi_health::{
    ConditionSet, ExposureOutcome, HealthContext, LifecycleHost, MixingGroupBoard,
    TransitionEvent,
};

use crate::person::{Person, Sex};

// ── Masks ─────────────────────────────────────────────────────────────────────

const MASK_NAMES: &[&str] = &[
    "susceptible",
    "infectious",
    "update-health",
    "update-births",
    "update-deaths",
    "travel",
];

/// Resolved handles for the fixed population mask set.
#[derive(Clone, Copy)]
pub struct Masks {
    /// Susceptible to at least one condition.
    pub susceptible: Mask,
    /// Infectious with at least one condition.
    pub infectious: Mask,
    /// Visited by the daily health pass.
    pub update_health: Mask,
    /// Candidates for the demographics birth pass.
    pub update_births: Mask,
    /// Candidates for the demographics mortality pass.
    pub update_deaths: Mask,
    /// Currently traveling or selected for travel updates.
    pub travel: Mask,
}

impl Masks {
    fn resolve(layout: &MaskLayout) -> Self {
        let get = |name: &str| {
            layout
                .mask(name)
                .unwrap_or_else(|| panic!("mask {name} missing from population layout"))
        };
        Self {
            susceptible: get("susceptible"),
            infectious: get("infectious"),
            update_health: get("update-health"),
            update_births: get("update-births"),
            update_deaths: get("update-deaths"),
            travel: get("travel"),
        }
    }
}

// ── Deferred removal queue ────────────────────────────────────────────────────

/// Mutex-guarded list of agents to free after the current pass.
#[derive(Default)]
pub struct RemovalQueue {
    pending: Mutex<Vec<(Day, AgentId)>>,
}

impl RemovalQueue {
    fn take(&self) -> Vec<(Day, AgentId)> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LifecycleHost for RemovalQueue {
    fn enqueue_for_removal(&self, day: Day, agent: AgentId) {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).push((day, agent));
    }
}

// ── Daily counters ────────────────────────────────────────────────────────────

/// Event counts accumulated since the last [`Population::take_counters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayCounters {
    pub new_infections: u64,
    pub new_symptomatic: u64,
    pub deaths: u64,
    pub births: u64,
}

// ── Population ────────────────────────────────────────────────────────────────

/// All living agents plus the queues and counters the day loop drains.
pub struct Population {
    arena: AgentArena<Person>,
    masks: Masks,
    conditions: ConditionSet,
    removals: RemovalQueue,
    maternity: Mutex<Vec<AgentId>>,
    counters: Mutex<DayCounters>,
    /// Next permanent identifier; monotonic, never reused.
    next_person_id: u64,
    seed: u64,
    rng: SimRng,
}

impl Population {
    pub fn new(conditions: ConditionSet, seed: u64) -> Self {
        let layout = MaskLayout::new(MASK_NAMES);
        let masks = Masks::resolve(&layout);
        Self {
            arena: AgentArena::new(layout),
            masks,
            conditions,
            removals: RemovalQueue::default(),
            maternity: Mutex::new(Vec::new()),
            counters: Mutex::new(DayCounters::default()),
            next_person_id: 0,
            seed,
            rng: SimRng::new(seed),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    pub fn masks(&self) -> Masks {
        self.masks
    }

    pub fn arena(&self) -> &AgentArena<Person> {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut AgentArena<Person> {
        &mut self.arena
    }

    pub fn person(&self, id: AgentId) -> EpiResult<&Person> {
        self.arena.get(id)
    }

    pub fn person_mut(&mut self, id: AgentId) -> EpiResult<&mut Person> {
        self.arena.get_mut(id)
    }

    /// Living agents.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Agents infectious with at least one condition right now.
    pub fn current_infectious(&self) -> usize {
        self.arena.mask_count(self.masks.infectious)
    }

    pub fn removals(&self) -> &RemovalQueue {
        &self.removals
    }

    /// Swaps the accumulated counters out, resetting them to zero.
    pub fn take_counters(&self) -> DayCounters {
        std::mem::take(&mut *self.counters.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn count(&self, bump: impl FnOnce(&mut DayCounters)) {
        bump(&mut self.counters.lock().unwrap_or_else(|e| e.into_inner()));
    }

    // ── Admission ─────────────────────────────────────────────────────────────

    /// Admits a person into the store, recycling a freed slot when one
    /// exists.  The permanent identifier is always fresh.
    pub fn add_person(
        &mut self,
        age: f64,
        sex: Sex,
        household: GroupId,
        workplace: Option<GroupId>,
        school: Option<GroupId>,
    ) -> EpiResult<AgentId> {
        let handle = self.arena.allocate();
        let id = PersonId(self.next_person_id);
        self.next_person_id += 1;

        let person = Person::new(
            id, handle.id, age, sex, household, workplace, school, self.seed, &self.conditions,
        );
        let susceptible = person.health.any_susceptible();
        *self.arena.get_mut(handle.id)? = person;
        if susceptible {
            self.arena.set_mask(self.masks.susceptible, handle.id);
        }
        Ok(handle.id)
    }

    // ── Exposure ──────────────────────────────────────────────────────────────

    /// Exposes `infectee` to `condition`, crediting `infector` when the
    /// exposure takes.  The infectee joins the health-pass mask; the
    /// infector's transmission counter is bumped through a shared
    /// reference, so this is also safe to reach from transmission code
    /// running inside a pass.
    pub fn expose(
        &mut self,
        board: &dyn MixingGroupBoard,
        condition: ConditionId,
        infectee: AgentId,
        infector: Option<AgentId>,
        group: Option<GroupId>,
        day: Day,
    ) -> EpiResult<ExposureOutcome> {
        let infector_pid = match infector {
            Some(a) => Some(self.arena.get(a)?.id),
            None => None,
        };

        let ctx = HealthContext {
            conditions: &self.conditions,
            groups: board,
            host: &self.removals,
        };
        let person = self.arena.get_mut(infectee)?;
        let age = person.age;
        let outcome = person.health.become_exposed(
            &ctx,
            condition,
            infector_pid,
            group,
            None,
            day,
            age,
            &mut person.rng,
        );

        if outcome == ExposureOutcome::Infected {
            self.arena.set_mask(self.masks.update_health, infectee);
            if !self.arena.get(infectee)?.health.any_susceptible() {
                self.arena.clear_mask(self.masks.susceptible, infectee);
            }
            if let Some(a) = infector {
                self.arena.get(a)?.health.record_infectee(condition);
            }
            self.count(|c| c.new_infections += 1);
        }
        Ok(outcome)
    }

    /// Plants an infection already `days_elapsed` days into its course,
    /// so imported cases are mid-infection on day zero.
    pub fn seed_infection(
        &mut self,
        board: &dyn MixingGroupBoard,
        condition: ConditionId,
        agent: AgentId,
        days_elapsed: i32,
    ) -> EpiResult<ExposureOutcome> {
        let outcome = self.expose(board, condition, agent, None, None, Day::ZERO)?;
        if outcome == ExposureOutcome::Infected && days_elapsed > 0 {
            let ctx = HealthContext {
                conditions: &self.conditions,
                groups: board,
                host: &self.removals,
            };
            let person = self.arena.get_mut(agent)?;
            person.health.advance_seed_infection(&ctx, condition, days_elapsed);
            if self.arena.get(agent)?.health.any_infectious() {
                self.arena.set_mask(self.masks.infectious, agent);
            }
        }
        Ok(outcome)
    }

    // ── Health pass ───────────────────────────────────────────────────────────

    /// Advances every agent in the health-pass mask by one day.  Runs
    /// on Rayon's pool with the `parallel` feature; each worker touches
    /// only its own agents plus the internally synchronized board,
    /// removal queue, and counters.
    pub fn run_health_pass(&mut self, day: Day, board: &dyn MixingGroupBoard) {
        let ctx = HealthContext {
            conditions: &self.conditions,
            groups: board,
            host: &self.removals,
        };
        let counters = &self.counters;

        self.arena.parallel_masked_apply(self.masks.update_health, |id, person| {
            if !person.health.is_alive() {
                return;
            }
            let age = person.age;
            let events = person.health.update_infection(&ctx, id, day, age, &mut person.rng);
            let onsets = events
                .iter()
                .filter(|e| e.event == TransitionEvent::Symptomatic)
                .count() as u64;
            if onsets > 0 {
                counters.lock().unwrap_or_else(|e| e.into_inner()).new_symptomatic += onsets;
            }
            person.health.update_group_counts(&ctx, day);
            person.health.update_immunity(&ctx, day);
        });

        self.sync_masks_after_health();
    }

    /// Serial mask reconciliation after the health pass: infectious and
    /// susceptible masks track the bitsets, and agents with nothing
    /// left to update retire from the health-pass mask.
    fn sync_masks_after_health(&mut self) {
        let mut updates: Vec<(AgentId, bool, bool, bool)> = Vec::new();
        self.arena.masked_apply(self.masks.update_health, |id, p| {
            let retire =
                p.is_alive() && !p.health.is_active() && !p.health.has_pending_immunity();
            updates.push((id, p.health.any_infectious(), p.health.any_susceptible(), retire));
        });
        for (id, infectious, susceptible, retire) in updates {
            if infectious {
                self.arena.set_mask(self.masks.infectious, id);
            } else {
                self.arena.clear_mask(self.masks.infectious, id);
            }
            if susceptible {
                self.arena.set_mask(self.masks.susceptible, id);
            } else {
                self.arena.clear_mask(self.masks.susceptible, id);
            }
            if retire {
                self.arena.clear_mask(self.masks.update_health, id);
            }
        }
    }

    // ── Serial drains ─────────────────────────────────────────────────────────

    /// Frees every agent queued for removal, returning their permanent
    /// identifiers.  Must run between passes, never during one.
    pub fn drain_removals(&mut self) -> Vec<PersonId> {
        let pending = self.removals.take();
        let mut removed = Vec::with_capacity(pending.len());
        for (day, id) in pending {
            if !self.arena.is_valid(id) {
                continue;
            }
            if let Ok(person) = self.arena.get(id) {
                log::info!("removing {} (slot {}) dead on {}", person.id, id, day);
                removed.push(person.id);
            }
            self.arena.free(id);
        }
        if !removed.is_empty() {
            self.count(|c| c.deaths += removed.len() as u64);
        }
        removed
    }

    /// Queues `mother` for delivery today.  Callable from inside a
    /// pass; the birth itself happens in [`Self::deliver_births`].
    pub fn enqueue_birth(&self, mother: AgentId) {
        self.maternity.lock().unwrap_or_else(|e| e.into_inner()).push(mother);
    }

    /// Admits one newborn per queued mother.  Serial.
    pub fn deliver_births(&mut self, day: Day) -> EpiResult<Vec<AgentId>> {
        let mothers =
            std::mem::take(&mut *self.maternity.lock().unwrap_or_else(|e| e.into_inner()));
        let mut newborns = Vec::with_capacity(mothers.len());
        for mother in mothers {
            let household = self.arena.get(mother)?.household;
            let sex = if self.rng.gen_bool(0.5) { Sex::Female } else { Sex::Male };
            let baby = self.add_person(0.0, sex, household, None, None)?;
            log::info!("birth into household {} (slot {}) on {}", household, baby, day);
            newborns.push(baby);
        }
        if !newborns.is_empty() {
            self.count(|c| c.births += newborns.len() as u64);
        }
        Ok(newborns)
    }
}
