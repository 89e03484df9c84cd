//! Per-agent health record.
//!
//! [`Health`] holds one agent's standing with every registered
//! condition: packed state bitsets, an optional active [`Infection`]
//! per condition, immunity expiry dates, and transmission bookkeeping.
//! All transitions funnel through the `become_*` methods so the
//! bitsets, infection slots, and logs can never drift apart.
//!
//! State corruption (double exposure, symptoms with no infection,
//! transitions on the dead) panics with the agent and condition in the
//! message; rule-level rejections surface as [`InfectionError`].

use std::sync::atomic::{AtomicU32, Ordering};

use epi_core::{AgentId, AgentRng, ConditionId, Day, GroupId, PersonId};

use crate::condition::{ConditionSet, ImmunityLoss};
use crate::groups::HealthContext;
use crate::infection::{Infection, InfectionError, TransitionEvent};
use crate::trajectory::Trajectory;

// ── Bitsets ───────────────────────────────────────────────────────────────────

/// One bit per registered condition, indexed by `ConditionId`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CondBits(pub u32);

impl CondBits {
    #[inline]
    pub fn get(self, c: ConditionId) -> bool {
        self.0 & (1 << c.0) != 0
    }

    #[inline]
    pub fn set(&mut self, c: ConditionId, value: bool) {
        if value {
            self.0 |= 1 << c.0;
        } else {
            self.0 &= !(1 << c.0);
        }
    }

    #[inline]
    pub fn any(self) -> bool {
        self.0 != 0
    }
}

/// What happened when an exposure attempt landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureOutcome {
    /// An infection started.
    Infected,
    /// The host mounted an immediate immune response instead.
    ImmuneResponse,
    /// The host was already immune; nothing changed.
    AlreadyImmune,
}

/// An event applied to one condition during a daily update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthEvent {
    pub condition: ConditionId,
    pub event: TransitionEvent,
}

// ── Health ────────────────────────────────────────────────────────────────────

/// One agent's health standing across every condition.
pub struct Health {
    owner: PersonId,
    household: GroupId,

    susceptible: CondBits,
    infected: CondBits,
    infectious: CondBits,
    symptomatic: CondBits,
    immune: CondBits,
    recovered: CondBits,
    at_risk: CondBits,

    infections: Vec<Option<Infection>>,
    /// Per-condition susceptibility scaling, 1.0 by default.
    susceptibility: Vec<f64>,
    immunity_end: Vec<Option<Day>>,
    /// Guards once-per-day group tallying per condition.
    last_counted_day: Vec<Option<Day>>,
    exposure_date: Vec<Option<Day>>,
    infector: Vec<Option<PersonId>>,
    exposure_group: Vec<Option<GroupId>>,
    /// People this agent infected, per condition.  Atomic so an
    /// infectee can bump its infector through a shared reference while
    /// the health pass runs in parallel.
    infectee_count: Vec<AtomicU32>,

    /// Strain of the first exposure, for serotype cross-immunity.
    previous_strain: Option<ConditionId>,
    days_symptomatic: i32,
    alive: bool,
    case_fatality: bool,
}

impl Health {
    pub fn new(owner: PersonId, household: GroupId, conditions: &ConditionSet) -> Self {
        let n = conditions.len();
        let mut susceptible = CondBits::default();
        for id in conditions.ids() {
            if conditions.get(id).params().assume_susceptible {
                susceptible.set(id, true);
            }
        }
        Self {
            owner,
            household,
            susceptible,
            infected: CondBits::default(),
            infectious: CondBits::default(),
            symptomatic: CondBits::default(),
            immune: CondBits::default(),
            recovered: CondBits::default(),
            at_risk: CondBits::default(),
            infections: (0..n).map(|_| None).collect(),
            susceptibility: vec![1.0; n],
            immunity_end: vec![None; n],
            last_counted_day: vec![None; n],
            exposure_date: vec![None; n],
            infector: vec![None; n],
            exposure_group: vec![None; n],
            infectee_count: (0..n).map(|_| AtomicU32::new(0)).collect(),
            previous_strain: None,
            days_symptomatic: 0,
            alive: true,
            case_fatality: false,
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────


    pub fn owner(&self) -> PersonId {
        self.owner
    }

    pub fn household(&self) -> GroupId {
        self.household
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_case_fatality(&self) -> bool {
        self.case_fatality
    }

    pub fn is_susceptible(&self, c: ConditionId) -> bool {
        self.susceptible.get(c)
    }

    pub fn is_infected(&self, c: ConditionId) -> bool {
        self.infected.get(c)
    }

    pub fn is_infectious(&self, c: ConditionId) -> bool {
        self.infectious.get(c)
    }

    pub fn is_symptomatic(&self, c: ConditionId) -> bool {
        self.symptomatic.get(c)
    }

    pub fn is_immune(&self, c: ConditionId) -> bool {
        self.immune.get(c)
    }

    pub fn has_recovered(&self, c: ConditionId) -> bool {
        self.recovered.get(c)
    }

    pub fn is_at_risk(&self, c: ConditionId) -> bool {
        self.at_risk.get(c)
    }

    /// Susceptibility scaling applied by transmission code; 1.0 unless
    /// an intervention modified it.
    pub fn susceptibility(&self, c: ConditionId) -> f64 {
        self.susceptibility[c.index()]
    }

    /// Carrying an active infection with any condition.
    pub fn is_active(&self) -> bool {
        self.infected.any()
    }

    pub fn any_susceptible(&self) -> bool {
        self.susceptible.any()
    }

    pub fn any_infectious(&self) -> bool {
        self.infectious.any()
    }

    /// Whether any granted immunity still has a pending expiry date.
    pub fn has_pending_immunity(&self) -> bool {
        self.immunity_end.iter().any(|e| e.is_some())
    }

    pub fn infection(&self, c: ConditionId) -> Option<&Infection> {
        self.infections[c.index()].as_ref()
    }

    pub fn infector(&self, c: ConditionId) -> Option<PersonId> {
        self.infector[c.index()]
    }

    pub fn exposure_date(&self, c: ConditionId) -> Option<Day> {
        self.exposure_date[c.index()]
    }

    pub fn exposure_group(&self, c: ConditionId) -> Option<GroupId> {
        self.exposure_group[c.index()]
    }

    pub fn days_symptomatic(&self) -> i32 {
        self.days_symptomatic
    }

    pub fn immunity_end(&self, c: ConditionId) -> Option<Day> {
        self.immunity_end[c.index()]
    }

    pub fn infectivity(&self, c: ConditionId, day: Day) -> f64 {
        self.infections[c.index()].as_ref().map_or(0.0, |i| i.infectivity(day))
    }

    pub fn symptoms(&self, c: ConditionId, day: Day) -> f64 {
        self.infections[c.index()].as_ref().map_or(0.0, |i| i.symptoms(day))
    }

    /// People this agent has infected with `c` so far.
    pub fn infectee_count(&self, c: ConditionId) -> u32 {
        self.infectee_count[c.index()].load(Ordering::Relaxed)
    }

    /// Called through a shared reference by each new infectee.
    pub fn record_infectee(&self, c: ConditionId) -> u32 {
        self.infectee_count[c.index()].fetch_add(1, Ordering::Relaxed) + 1
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    /// Starts an infection with `c`.
    ///
    /// Panics if the agent is dead or already carries an active
    /// infection with `c` — transmission must never select such a
    /// host, so reaching here means upstream state is corrupt.
    pub fn become_exposed(
        &mut self,
        ctx: &HealthContext<'_>,
        c: ConditionId,
        infector: Option<PersonId>,
        group: Option<GroupId>,
        trajectory: Option<Trajectory>,
        day: Day,
        age: f64,
        rng: &mut AgentRng,
    ) -> ExposureOutcome {
        assert!(self.alive, "exposure of dead agent {} to {} on {}", self.owner, c, day);
        assert!(
            !self.infected.get(c),
            "double exposure: {} already infected with {} on {}",
            self.owner,
            c,
            day
        );
        if self.immune.get(c) {
            return ExposureOutcome::AlreadyImmune;
        }

        let condition = ctx.conditions.get(c);
        if condition.generate_immune_response(age, rng) {
            self.become_immune(ctx, c, day);
            return ExposureOutcome::ImmuneResponse;
        }

        let trajectory = trajectory.unwrap_or_else(|| condition.draw_trajectory(age, rng));
        let infection = Infection::new(c, condition, day, trajectory);
        self.infections[c.index()] = Some(infection);
        self.infected.set(c, true);
        self.infectious.set(c, false);
        self.symptomatic.set(c, false);
        self.exposure_date[c.index()] = Some(day);
        self.infector[c.index()] = infector;
        self.exposure_group[c.index()] = group;
        self.become_unsusceptible(c);
        if let Some(g) = group {
            ctx.groups.record_new_infection(g, c);
        }
        log::debug!("health record: {} exposed to {} on {}", self.owner, condition.name(), day);

        self.apply_cross_immunity(ctx, c, day);
        ExposureOutcome::Infected
    }

    /// Serotype interaction: the first infection immunizes against all
    /// sibling strains except the one contracted; a second, distinct
    /// strain immunizes against everything remaining.
    fn apply_cross_immunity(&mut self, ctx: &HealthContext<'_>, c: ConditionId, day: Day) {
        if !ctx.conditions.cross_immunity {
            return;
        }
        match self.previous_strain {
            None => {
                for other in ctx.conditions.ids() {
                    if other != c {
                        self.grant_timed_immunity(ctx, other, day);
                    }
                }
                self.previous_strain = Some(c);
            }
            Some(prev) if prev != c => {
                for other in ctx.conditions.ids() {
                    if !self.infected.get(other) {
                        self.grant_timed_immunity(ctx, other, day);
                    }
                }
            }
            Some(_) => {}
        }
    }

    /// Immunity plus its expiry per the condition's waning policy.
    fn grant_timed_immunity(&mut self, ctx: &HealthContext<'_>, c: ConditionId, day: Day) {
        self.become_immune(ctx, c, day);
        self.immunity_end[c.index()] = match ctx.conditions.get(c).params().immunity_loss {
            ImmunityLoss::Perpetual => None,
            ImmunityLoss::After(days) => Some(day.offset(days as i32)),
        };
    }

    /// Restores susceptibility.  Idempotent; panics if an active
    /// infection exists (a carrier cannot be re-exposed).
    pub fn become_susceptible(&mut self, c: ConditionId) {
        assert!(
            self.infections[c.index()].is_none(),
            "susceptible with active infection: {} for {}",
            self.owner,
            c
        );
        if self.susceptible.get(c) {
            log::debug!("health record: {} already susceptible to {}", self.owner, c);
            return;
        }
        self.susceptible.set(c, true);
    }

    pub fn become_unsusceptible(&mut self, c: ConditionId) {
        self.susceptible.set(c, false);
    }

    pub fn become_infectious(&mut self, ctx: &HealthContext<'_>, c: ConditionId, day: Day) {
        assert!(
            self.infections[c.index()].is_some(),
            "infectious without active infection: {} for {} on {}",
            self.owner,
            c,
            day
        );
        self.infectious.set(c, true);
        log::debug!(
            "health record: {} infectious with {} on {}",
            self.owner,
            ctx.conditions.get(c).name(),
            day
        );
    }

    pub fn become_noninfectious(&mut self, c: ConditionId) {
        self.infectious.set(c, false);
    }

    pub fn resolve_symptoms(&mut self, c: ConditionId) {
        self.symptomatic.set(c, false);
    }

    pub fn become_symptomatic(&mut self, ctx: &HealthContext<'_>, c: ConditionId, day: Day) {
        assert!(
            self.infections[c.index()].is_some(),
            "symptomatic without active infection: {} for {} on {}",
            self.owner,
            c,
            day
        );
        if self.symptomatic.get(c) {
            log::debug!(
                "health record: {} already symptomatic with {} on {}",
                self.owner,
                ctx.conditions.get(c).name(),
                day
            );
            return;
        }
        self.symptomatic.set(c, true);
        ctx.groups.record_new_symptomatic(self.household, c);
        log::debug!(
            "health record: {} symptomatic with {} on {}",
            self.owner,
            ctx.conditions.get(c).name(),
            day
        );
    }

    pub fn become_immune(&mut self, ctx: &HealthContext<'_>, c: ConditionId, day: Day) {
        ctx.conditions.get(c).on_survivor_immunity();
        self.immune.set(c, true);
        self.susceptible.set(c, false);
        self.infectious.set(c, false);
        self.symptomatic.set(c, false);
        log::debug!(
            "health record: {} immune to {} on {}",
            self.owner,
            ctx.conditions.get(c).name(),
            day
        );
    }

    /// Ends the infection: drops the `Infection` and clears the
    /// susceptible, infectious, and symptomatic standing.
    pub fn become_removed(&mut self, c: ConditionId) {
        self.infections[c.index()] = None;
        self.infected.set(c, false);
        self.susceptible.set(c, false);
        self.infectious.set(c, false);
        self.symptomatic.set(c, false);
    }

    /// Resolves the infection: removal plus immunity per the
    /// condition's waning policy.
    pub fn recover(&mut self, ctx: &HealthContext<'_>, c: ConditionId, day: Day) {
        self.recovered.set(c, true);
        self.become_removed(c);
        self.grant_timed_immunity(ctx, c, day);
        log::debug!(
            "health record: {} recovered from {} on {}",
            self.owner,
            ctx.conditions.get(c).name(),
            day
        );
    }

    /// Marks the agent as a case fatality, bumps the household's
    /// fatality tally, and enqueues the agent for removal after the
    /// pass.  The record stays valid through the rest of the day; the
    /// store frees the slot before the next day begins.
    pub fn become_case_fatality(
        &mut self,
        ctx: &HealthContext<'_>,
        agent: AgentId,
        c: ConditionId,
        day: Day,
    ) {
        self.case_fatality = true;
        self.alive = false;
        self.become_removed(c);
        ctx.groups.record_fatality(self.household, c);
        log::debug!(
            "health record: {} died of {} on {}",
            self.owner,
            ctx.conditions.get(c).name(),
            day
        );
        ctx.host.enqueue_for_removal(day, agent);
    }

    // ── Daily updates ─────────────────────────────────────────────────────────

    /// Advances every active infection to `day`, applying milestone
    /// events and the case-fatality draw.  Returns the events applied,
    /// in per-condition chronological order.
    pub fn update_infection(
        &mut self,
        ctx: &HealthContext<'_>,
        agent: AgentId,
        day: Day,
        age: f64,
        rng: &mut AgentRng,
    ) -> Vec<HealthEvent> {
        let mut applied = Vec::new();
        if !self.alive {
            return applied;
        }
        if self.symptomatic.any() {
            self.days_symptomatic += 1;
        }

        for c in ctx.conditions.ids() {
            if !self.infected.get(c) {
                continue;
            }
            let condition = ctx.conditions.get(c);
            let update = {
                let infection = self.infections[c.index()]
                    .as_mut()
                    .unwrap_or_else(|| {
                        panic!(
                            "infected bit set with empty slot: {} for {} on {}",
                            self.owner, c, day
                        )
                    });
                infection.update(day, condition, age, self.days_symptomatic, rng)
            };
            for event in &update.events {
                self.apply_event(ctx, c, *event, day);
                applied.push(HealthEvent { condition: c, event: *event });
            }
            if update.fatal && self.alive {
                self.become_case_fatality(ctx, agent, c, day);
            }
        }
        applied
    }

    fn apply_event(&mut self, ctx: &HealthContext<'_>, c: ConditionId, event: TransitionEvent, day: Day) {
        match event {
            TransitionEvent::Unsusceptible => self.become_unsusceptible(c),
            TransitionEvent::Infectious => self.become_infectious(ctx, c, day),
            TransitionEvent::Symptomatic => self.become_symptomatic(ctx, c, day),
            TransitionEvent::Recover => self.recover(ctx, c, day),
        }
    }

    /// Plants a seed infection already `days` into its course.
    pub fn advance_seed_infection(
        &mut self,
        ctx: &HealthContext<'_>,
        c: ConditionId,
        days: i32,
    ) {
        let events = {
            let infection = self.infections[c.index()]
                .as_mut()
                .unwrap_or_else(|| {
                    panic!("seed advance without active infection: {} for {}", self.owner, c)
                });
            infection.advance_seed_infection(days)
        };
        for event in events {
            self.apply_event(ctx, c, event, Day::ZERO);
        }
    }

    /// Contributes today's infectious/symptomatic standing to the
    /// household tallies, at most once per condition per day.
    pub fn update_group_counts(&mut self, ctx: &HealthContext<'_>, day: Day) {
        for c in ctx.conditions.ids() {
            if self.last_counted_day[c.index()] == Some(day) {
                continue;
            }
            self.last_counted_day[c.index()] = Some(day);
            if self.infectious.get(c) {
                ctx.groups.record_infectious(self.household, c);
            }
            if self.symptomatic.get(c) {
                ctx.groups.record_symptomatic(self.household, c);
            }
        }
    }

    /// Expires waning immunity on its exact end day.
    pub fn update_immunity(&mut self, ctx: &HealthContext<'_>, day: Day) {
        for c in ctx.conditions.ids() {
            if self.immune.get(c) && self.immunity_end[c.index()] == Some(day) {
                self.immune.set(c, false);
                self.immunity_end[c.index()] = None;
                if ctx.conditions.get(c).params().assume_susceptible {
                    self.susceptible.set(c, true);
                }
                log::debug!(
                    "health record: {} immunity to {} waned on {}",
                    self.owner,
                    ctx.conditions.get(c).name(),
                    day
                );
            }
        }
    }

    /// Ends the record at death or out-migration.
    pub fn terminate(&mut self, day: Day) {
        self.alive = false;
        self.infected = CondBits::default();
        self.infectious = CondBits::default();
        self.symptomatic = CondBits::default();
        for slot in &mut self.infections {
            *slot = None;
        }
        log::debug!("health record: {} terminated on {}", self.owner, day);
    }

    /// Flags the agent as high-risk for severe outcomes of `c`.
    pub fn declare_at_risk(&mut self, c: ConditionId) {
        self.at_risk.set(c, true);
    }

    /// Scales the agent's susceptibility to `c`.
    pub fn modify_susceptibility(
        &mut self,
        c: ConditionId,
        multiplier: f64,
    ) -> Result<(), InfectionError> {
        if multiplier < 0.0 {
            return Err(InfectionError::NegativeMultiplier(multiplier));
        }
        self.susceptibility[c.index()] *= multiplier;
        Ok(())
    }

    // ── Period modification pass-throughs ─────────────────────────────────────

    pub fn modify_infectivity(&mut self, c: ConditionId, multiplier: f64) -> Result<(), InfectionError> {
        self.active_infection_mut(c)?.modify_infectivity(multiplier)
    }

    pub fn modify_symptomatic_period(
        &mut self,
        c: ConditionId,
        multiplier: f64,
        today: Day,
    ) -> Result<(), InfectionError> {
        self.active_infection_mut(c)?.modify_symptomatic_period(multiplier, today)
    }

    pub fn modify_asymptomatic_period(
        &mut self,
        c: ConditionId,
        multiplier: f64,
        today: Day,
    ) -> Result<(), InfectionError> {
        self.active_infection_mut(c)?.modify_asymptomatic_period(multiplier, today)
    }

    pub fn modify_infectious_period(
        &mut self,
        c: ConditionId,
        multiplier: f64,
        today: Day,
    ) -> Result<(), InfectionError> {
        self.active_infection_mut(c)?.modify_infectious_period(multiplier, today)
    }

    pub fn modify_develops_symptoms(
        &mut self,
        ctx: &HealthContext<'_>,
        c: ConditionId,
        today: Day,
    ) -> Result<(), InfectionError> {
        let days = ctx.conditions.get(c).params().days_symptomatic_default;
        self.active_infection_mut(c)?.modify_develops_symptoms(days, today)
    }

    fn active_infection_mut(&mut self, c: ConditionId) -> Result<&mut Infection, InfectionError> {
        self.infections[c.index()].as_mut().ok_or(InfectionError::NoTrajectory)
    }
}

impl Default for Health {
    /// Dead, condition-less placeholder for freshly reset store slots.
    /// Replaced wholesale by [`Health::new`] when a person moves in.
    fn default() -> Self {
        Self {
            owner: PersonId::INVALID,
            household: GroupId::INVALID,
            susceptible: CondBits::default(),
            infected: CondBits::default(),
            infectious: CondBits::default(),
            symptomatic: CondBits::default(),
            immune: CondBits::default(),
            recovered: CondBits::default(),
            at_risk: CondBits::default(),
            infections: Vec::new(),
            susceptibility: Vec::new(),
            immunity_end: Vec::new(),
            last_counted_day: Vec::new(),
            exposure_date: Vec::new(),
            infector: Vec::new(),
            exposure_group: Vec::new(),
            infectee_count: Vec::new(),
            previous_strain: None,
            days_symptomatic: 0,
            alive: false,
            case_fatality: false,
        }
    }
}
