//! Condition descriptors.
//!
//! A [`Condition`] supplies everything the infection engine needs that
//! is not per-agent: trajectory generation, thresholds, case-fatality
//! draws, and immunity policy. [`ParamCondition`] is the table-driven
//! implementation used by the loader; model code can implement the
//! trait directly for bespoke natural histories.

use epi_core::{AgentRng, ConditionId};

use crate::age_map::AgeMap;
use crate::trajectory::Trajectory;

/// What happens to immunity after recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImmunityLoss {
    /// Immunity never wanes.
    #[default]
    Perpetual,
    /// Immunity ends this many days after recovery.
    After(u32),
}

/// Static parameters of a condition.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionParams {
    pub name: String,
    /// Daily infectivity strictly above this makes the host infectious.
    pub infectivity_threshold: f64,
    /// Daily symptomaticity strictly above this makes the host symptomatic.
    pub symptomaticity_threshold: f64,
    pub immunity_loss: ImmunityLoss,
    pub case_fatality_enabled: bool,
    /// Chronic conditions never resolve on their own; the host stays in
    /// the active state until death.
    pub chronic: bool,
    /// Days after exposure at which a chronic infection that has not
    /// yet turned infectious is forced to.
    pub chronic_latent_days: i32,
    /// Fallback symptomatic span when symptoms are grafted onto a
    /// trajectory that had none.
    pub days_symptomatic_default: u32,
    /// Whether agents start out susceptible to this condition.
    pub assume_susceptible: bool,
    /// Age-dependent at-risk fraction, if the condition tracks one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub at_risk: Option<AgeMap>,
}

impl Default for ConditionParams {
    fn default() -> Self {
        Self {
            name: String::new(),
            infectivity_threshold: 0.0,
            symptomaticity_threshold: 0.5,
            immunity_loss: ImmunityLoss::Perpetual,
            case_fatality_enabled: false,
            chronic: false,
            chronic_latent_days: 3,
            days_symptomatic_default: 7,
            assume_susceptible: true,
            at_risk: None,
        }
    }
}

/// A transmissible condition with its natural-history rules.
pub trait Condition: Send + Sync {
    fn params(&self) -> &ConditionParams;

    /// Draws the trajectory for a fresh exposure.
    fn draw_trajectory(&self, age: f64, rng: &mut AgentRng) -> Trajectory;

    /// Whether this infection kills the host, evaluated once per
    /// symptomatic day.
    fn is_fatal(
        &self,
        age: f64,
        symptom_level: f64,
        days_symptomatic: i32,
        rng: &mut AgentRng,
    ) -> bool {
        let _ = (age, symptom_level, days_symptomatic, rng);
        false
    }

    /// Whether a newly exposed host mounts an immediate immune response
    /// and skips the infection entirely.
    fn generate_immune_response(&self, age: f64, rng: &mut AgentRng) -> bool {
        let _ = (age, rng);
        false
    }

    /// Bookkeeping hook fired whenever a host gains immunity to this
    /// condition.  Implementations that track immunity totals use
    /// interior mutability; the hook may run from a parallel pass.
    fn on_survivor_immunity(&self) {}

    fn name(&self) -> &str {
        &self.params().name
    }
}

/// Table-driven condition: fixed trajectory, probabilistic immune
/// response and case fatality.
#[derive(Debug, Clone)]
pub struct ParamCondition {
    params: ConditionParams,
    trajectory: Trajectory,
    /// Per-exposure probability of an immediate immune response.
    pub immune_response_prob: f64,
    /// Per-symptomatic-day probability of death, scaled by the at-risk
    /// map when one is present.
    pub case_fatality_prob: f64,
}

impl ParamCondition {
    pub fn new(params: ConditionParams, trajectory: Trajectory) -> Self {
        Self { params, trajectory, immune_response_prob: 0.0, case_fatality_prob: 0.0 }
    }

    pub fn with_immune_response(mut self, prob: f64) -> Self {
        self.immune_response_prob = prob;
        self
    }

    pub fn with_case_fatality(mut self, prob: f64) -> Self {
        self.case_fatality_prob = prob;
        self.params.case_fatality_enabled = true;
        self
    }
}

impl Condition for ParamCondition {
    fn params(&self) -> &ConditionParams {
        &self.params
    }

    fn draw_trajectory(&self, _age: f64, _rng: &mut AgentRng) -> Trajectory {
        self.trajectory.clone()
    }

    fn is_fatal(
        &self,
        age: f64,
        symptom_level: f64,
        _days_symptomatic: i32,
        rng: &mut AgentRng,
    ) -> bool {
        if !self.params.case_fatality_enabled
            || symptom_level <= self.params.symptomaticity_threshold
        {
            return false;
        }
        let scale = self.params.at_risk.as_ref().map_or(1.0, |m| m.find_value(age));
        rng.gen_bool(self.case_fatality_prob * scale)
    }

    fn generate_immune_response(&self, _age: f64, rng: &mut AgentRng) -> bool {
        self.immune_response_prob > 0.0 && rng.gen_bool(self.immune_response_prob)
    }
}

/// The registry of conditions in play for a run.
///
/// Condition ids index into the registry in registration order. At most
/// 32 conditions are supported, matching the width of the per-agent
/// state bitsets.
pub struct ConditionSet {
    conditions: Vec<Box<dyn Condition>>,
    /// When set, sibling conditions confer cross-immunity on exposure
    /// (dengue-style serotype interaction).
    pub cross_immunity: bool,
}

pub const MAX_CONDITIONS: usize = 32;

impl ConditionSet {
    pub fn new() -> Self {
        Self { conditions: Vec::new(), cross_immunity: false }
    }

    pub fn register(&mut self, condition: Box<dyn Condition>) -> ConditionId {
        assert!(
            self.conditions.len() < MAX_CONDITIONS,
            "condition registry full ({MAX_CONDITIONS} max)"
        );
        let id = ConditionId(self.conditions.len() as u16);
        self.conditions.push(condition);
        id
    }

    /// Panics when `id` was never registered.
    pub fn get(&self, id: ConditionId) -> &dyn Condition {
        assert!(
            (id.index()) < self.conditions.len(),
            "unknown condition {id}"
        );
        self.conditions[id.index()].as_ref()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ConditionId> + '_ {
        (0..self.conditions.len() as u16).map(ConditionId)
    }
}

impl Default for ConditionSet {
    fn default() -> Self {
        Self::new()
    }
}
