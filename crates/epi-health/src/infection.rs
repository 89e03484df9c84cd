//! Single-infection natural history.
//!
//! An [`Infection`] binds one agent to one condition from exposure to
//! resolution.  Milestone dates (infectious onset, symptom onset,
//! recovery) are derived from the trajectory once at exposure and fire
//! in the daily [`Infection::update`] when the current day equals the
//! stored date exactly.  Interventions that stretch or shrink periods
//! rewrite the trajectory tail and re-derive the dates, so an update
//! that runs after the modification sees a consistent timeline.

use epi_core::{AgentRng, ConditionId, Day};
use thiserror::Error;

use crate::condition::Condition;
use crate::trajectory::Trajectory;

// ── Events ────────────────────────────────────────────────────────────────────

/// A milestone crossed by an infection during one daily update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEvent {
    /// Host stops being susceptible to this condition.
    Unsusceptible,
    /// Host begins shedding.
    Infectious,
    /// Symptom onset.
    Symptomatic,
    /// Infection resolves.
    Recover,
}

/// Result of one daily update: milestone events in chronological
/// order, plus whether a case-fatality draw came up fatal.
#[derive(Debug, Default)]
pub struct InfectionUpdate {
    pub events: Vec<TransitionEvent>,
    pub fatal: bool,
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Rejected period modifications.  These are domain-rule violations by
/// intervention code, not corruption, so they surface as errors rather
/// than panics.
#[derive(Debug, Error, PartialEq)]
pub enum InfectionError {
    #[error("period multiplier must be non-negative, got {0}")]
    NegativeMultiplier(f64),
    #[error("symptomatic period already elapsed by {0}")]
    PastSymptomaticPeriod(Day),
    #[error("asymptomatic period already elapsed by {0}")]
    PastAsymptomaticPeriod(Day),
    #[error("infection has no trajectory to modify")]
    NoTrajectory,
}

// ── Infection ─────────────────────────────────────────────────────────────────

/// One agent's course of one condition.
#[derive(Debug, Clone)]
pub struct Infection {
    condition: ConditionId,
    exposure_date: Day,
    trajectory: Trajectory,
    chronic: bool,
    infectivity_threshold: f64,
    symptomaticity_threshold: f64,
    infectious_date: Option<Day>,
    symptomatic_date: Option<Day>,
    /// First infectious day preceding symptom onset, when one exists.
    asymptomatic_date: Option<Day>,
    recovery_date: Day,
    latent_period: i32,
    incubation_period: i32,
    /// Infectious-but-asymptomatic days, counted per day so curves
    /// whose symptoms come and go are tallied correctly.
    asymptomatic_period: i32,
    symptomatic_period: i32,
}

impl Infection {
    /// Starts an infection at `exposure_date` with a drawn trajectory
    /// and derives all milestone dates.
    pub fn new(
        condition_id: ConditionId,
        condition: &dyn Condition,
        exposure_date: Day,
        trajectory: Trajectory,
    ) -> Self {
        let params = condition.params();
        let mut inf = Self {
            condition: condition_id,
            exposure_date,
            trajectory,
            chronic: params.chronic,
            infectivity_threshold: params.infectivity_threshold,
            symptomaticity_threshold: params.symptomaticity_threshold,
            infectious_date: None,
            symptomatic_date: None,
            asymptomatic_date: None,
            recovery_date: exposure_date,
            latent_period: 0,
            incubation_period: 0,
            asymptomatic_period: 0,
            symptomatic_period: 0,
        };
        inf.determine_transition_dates();
        inf
    }

    /// Derives infectious, symptomatic, asymptomatic, and recovery
    /// dates from the trajectory in a single scan, along with the four
    /// period lengths.
    ///
    /// The latent period is the run of leading days whose infectivity
    /// sits below the infectivity threshold; the incubation period is
    /// the run below the symptomaticity threshold.  The symptomatic
    /// and asymptomatic periods count qualifying days individually, so
    /// they stay accurate for curves whose symptomaticity dips back
    /// under the threshold mid-course.  Recovery is the first day past
    /// the trajectory.  Chronic or trajectory-less infections recover
    /// at the far horizon instead.
    fn determine_transition_dates(&mut self) {
        let mut was_latent = true;
        let mut was_incubating = true;
        self.infectious_date = None;
        self.symptomatic_date = None;
        self.asymptomatic_date = None;
        self.latent_period = 0;
        self.incubation_period = 0;
        self.asymptomatic_period = 0;
        self.symptomatic_period = 0;

        for (offset, point) in self.trajectory.points().iter().enumerate() {
            let day = self.exposure_date.offset(offset as i32);
            let infectious = point.infectivity > self.infectivity_threshold;
            let symptomatic = point.symptomaticity > self.symptomaticity_threshold;
            if was_latent && infectious {
                self.infectious_date = Some(day);
                // Infectious before symptomatic means an asymptomatic
                // shedding span starts here.
                if was_incubating {
                    self.asymptomatic_date = Some(day);
                }
                was_latent = false;
            }
            if was_incubating && symptomatic {
                self.symptomatic_date = Some(day);
                was_incubating = false;
            }
            if was_latent {
                self.latent_period += 1;
            }
            if was_incubating {
                self.incubation_period += 1;
            }
            if symptomatic {
                self.symptomatic_period += 1;
            } else if infectious {
                self.asymptomatic_period += 1;
            }
        }

        self.recovery_date = if self.chronic || self.trajectory.duration() == 0 {
            self.exposure_date.offset(Day::FAR_HORIZON)
        } else {
            self.exposure_date.offset(self.trajectory.duration() as i32)
        };
    }

    // ── Daily update ──────────────────────────────────────────────────────────

    /// Advances the infection to `today`, firing any milestone whose
    /// date is exactly `today` and drawing case fatality on
    /// symptomatic days.
    pub fn update(
        &mut self,
        today: Day,
        condition: &dyn Condition,
        age: f64,
        days_symptomatic: i32,
        rng: &mut AgentRng,
    ) -> InfectionUpdate {
        let mut out = InfectionUpdate::default();
        let days_post = today.since(self.exposure_date);

        // Chronic infections that never crossed the infectivity
        // threshold are forced infectious shortly after exposure.
        if self.chronic
            && self.infectious_date.is_none()
            && days_post > condition.params().chronic_latent_days
        {
            self.infectious_date = Some(today);
        }

        if self.infectious_date == Some(today) {
            out.events.push(TransitionEvent::Infectious);
        }
        if self.symptomatic_date == Some(today) {
            out.events.push(TransitionEvent::Symptomatic);
        }
        if today == self.recovery_date {
            out.events.push(TransitionEvent::Recover);
        }

        if condition.params().case_fatality_enabled
            && self.is_symptomatic_on(today)
            && condition.is_fatal(age, self.symptoms(today), days_symptomatic, rng)
        {
            out.fatal = true;
        }
        out
    }

    /// Rewinds the exposure by `days` so seed infections planted at
    /// startup are already mid-course on day zero.  Returns every
    /// milestone whose date now falls at or before day zero, in
    /// chronological order, so the host can catch its state up.
    pub fn advance_seed_infection(&mut self, days: i32) -> Vec<TransitionEvent> {
        self.exposure_date = self.exposure_date.offset(-days);
        self.determine_transition_dates();

        let mut events = vec![TransitionEvent::Unsusceptible];
        if matches!(self.infectious_date, Some(d) if d <= Day::ZERO) {
            events.push(TransitionEvent::Infectious);
        }
        if matches!(self.symptomatic_date, Some(d) if d <= Day::ZERO) {
            events.push(TransitionEvent::Symptomatic);
        }
        if self.recovery_date <= Day::ZERO {
            events.push(TransitionEvent::Recover);
        }
        events
    }

    // ── Period modification ───────────────────────────────────────────────────

    /// Scales every remaining infectivity value by `multiplier`.
    pub fn modify_infectivity(&mut self, multiplier: f64) -> Result<(), InfectionError> {
        if multiplier < 0.0 {
            return Err(InfectionError::NegativeMultiplier(multiplier));
        }
        let scaled = Trajectory::new(
            self.trajectory
                .points()
                .iter()
                .map(|p| crate::trajectory::TrajectoryPoint {
                    infectivity: p.infectivity * multiplier,
                    symptomaticity: p.symptomaticity,
                })
                .collect(),
        );
        self.trajectory = scaled;
        self.determine_transition_dates();
        Ok(())
    }

    /// Scales the symptomatic period.  Before onset the whole span is
    /// rescaled; during it only the remaining days are, never below
    /// one so the host does not recover retroactively.
    pub fn modify_symptomatic_period(
        &mut self,
        multiplier: f64,
        today: Day,
    ) -> Result<(), InfectionError> {
        if multiplier < 0.0 {
            return Err(InfectionError::NegativeMultiplier(multiplier));
        }
        let symptomatic = self.symptomatic_date.ok_or(InfectionError::NoTrajectory)?;
        if today >= self.recovery_date {
            return Err(InfectionError::PastSymptomaticPeriod(today));
        }

        let symp_offset = symptomatic.since(self.exposure_date).max(0) as usize;
        let (from, old_len) = if today <= symptomatic {
            (symp_offset, self.trajectory.duration() - symp_offset)
        } else {
            // Mid-period: today's point is already consumed.
            let from = (today.since(self.exposure_date) + 1) as usize;
            (from, self.trajectory.duration().saturating_sub(from))
        };
        let new_len = ((old_len as f64 * multiplier).round() as usize).max(1);
        self.trajectory.rewrite_symptomatic_tail(from, new_len);
        self.determine_transition_dates();
        Ok(())
    }

    /// Scales the asymptomatic-infectious span (infectious onset to
    /// symptom onset), shifting symptom onset and everything after it.
    pub fn modify_asymptomatic_period(
        &mut self,
        multiplier: f64,
        today: Day,
    ) -> Result<(), InfectionError> {
        if multiplier < 0.0 {
            return Err(InfectionError::NegativeMultiplier(multiplier));
        }
        let (asymptomatic, symptomatic) = match (self.asymptomatic_date, self.symptomatic_date) {
            (Some(a), Some(s)) if a < s => (a, s),
            _ => return Err(InfectionError::NoTrajectory),
        };
        if today >= symptomatic {
            return Err(InfectionError::PastAsymptomaticPeriod(today));
        }

        let symp_offset = symptomatic.since(self.exposure_date).max(0) as usize;
        let from = if today <= asymptomatic {
            asymptomatic.since(self.exposure_date).max(0) as usize
        } else {
            (today.since(self.exposure_date) + 1) as usize
        };
        let old_len = symp_offset.saturating_sub(from);
        let new_len = ((old_len as f64 * multiplier).round() as usize).max(1);
        self.trajectory.rewrite_asymptomatic_span(from, new_len, symp_offset);
        self.determine_transition_dates();
        Ok(())
    }

    /// Scales the whole infectious period: the asymptomatic span first
    /// when today still precedes symptom onset, then the symptomatic
    /// tail.
    pub fn modify_infectious_period(
        &mut self,
        multiplier: f64,
        today: Day,
    ) -> Result<(), InfectionError> {
        if let Some(symptomatic) = self.symptomatic_date {
            if today < symptomatic && self.asymptomatic_date.is_some() {
                self.modify_asymptomatic_period(multiplier, today)?;
            }
            self.modify_symptomatic_period(multiplier, today)
        } else {
            // Fully asymptomatic course: rescale the remaining tail.
            if today >= self.recovery_date {
                return Err(InfectionError::PastAsymptomaticPeriod(today));
            }
            let from = (today.since(self.exposure_date) + 1).max(0) as usize;
            let old_len = self.trajectory.duration().saturating_sub(from);
            let new_len = ((old_len as f64 * multiplier).round() as usize).max(1);
            self.trajectory.rewrite_symptomatic_tail(from, new_len);
            self.determine_transition_dates();
            Ok(())
        }
    }

    /// Forces a previously asymptomatic course to develop symptoms:
    /// grafts a symptomatic tail of `symptomatic_days` onto the curve.
    pub fn modify_develops_symptoms(
        &mut self,
        symptomatic_days: u32,
        today: Day,
    ) -> Result<(), InfectionError> {
        if self.symptomatic_date.is_some() {
            return Ok(());
        }
        if today >= self.recovery_date {
            return Err(InfectionError::PastSymptomaticPeriod(today));
        }
        if self.trajectory.duration() == 0 {
            return Err(InfectionError::NoTrajectory);
        }
        let symp_offset = self.trajectory.duration();
        self.trajectory.set_develops_symptoms(symp_offset, symptomatic_days as usize);
        self.determine_transition_dates();
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn condition(&self) -> ConditionId {
        self.condition
    }

    pub fn exposure_date(&self) -> Day {
        self.exposure_date
    }

    /// The host stops being susceptible the day it is exposed.
    pub fn unsusceptible_date(&self) -> Day {
        self.exposure_date
    }

    pub fn infectious_date(&self) -> Option<Day> {
        self.infectious_date
    }

    pub fn symptomatic_date(&self) -> Option<Day> {
        self.symptomatic_date
    }

    pub fn asymptomatic_date(&self) -> Option<Day> {
        self.asymptomatic_date
    }

    pub fn recovery_date(&self) -> Day {
        self.recovery_date
    }

    /// Days from exposure to infectious onset.
    pub fn latent_period(&self) -> i32 {
        self.latent_period
    }

    /// Days from exposure to symptom onset.
    pub fn incubation_period(&self) -> i32 {
        self.incubation_period
    }

    /// Days spent infectious without symptoms.
    pub fn asymptomatic_period(&self) -> i32 {
        self.asymptomatic_period
    }

    /// Days spent symptomatic, contiguous or not.
    pub fn symptomatic_period(&self) -> i32 {
        self.symptomatic_period
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Infectivity contributed on `day`; zero outside the course.
    pub fn infectivity(&self, day: Day) -> f64 {
        self.trajectory.point(day.since(self.exposure_date)).infectivity
    }

    /// Symptom level on `day`; zero outside the course.
    pub fn symptoms(&self, day: Day) -> f64 {
        self.trajectory.point(day.since(self.exposure_date)).symptomaticity
    }

    pub fn is_infectious_on(&self, day: Day) -> bool {
        self.infectivity(day) > self.infectivity_threshold
    }

    pub fn is_symptomatic_on(&self, day: Day) -> bool {
        self.symptoms(day) > self.symptomaticity_threshold
    }
}
