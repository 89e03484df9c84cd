//! The per-agent record stored in the population arena.

use epi_core::{AgentId, AgentRng, GroupId, PersonId};
use epi_health::{ConditionSet, Health};

/// Biological sex, as recorded in synthetic population files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sex {
    #[default]
    Female,
    Male,
}

impl Sex {
    /// Parses the single-letter code used by population files.
    pub fn from_code(code: char) -> Option<Sex> {
        match code.to_ascii_uppercase() {
            'F' => Some(Sex::Female),
            'M' => Some(Sex::Male),
            _ => None,
        }
    }
}

/// One simulated person.
///
/// A `Person` occupies one arena slot for its whole life; the slot
/// index is recycled at death while [`Person::id`] never is.  The
/// record carries its own [`AgentRng`], so a bulk pass holding the
/// record exclusively also owns all of its randomness.
pub struct Person {
    /// Permanent identifier; assigned once and never reused.
    pub id: PersonId,
    /// Arena slot currently occupied.  Recycled after death.
    pub index: AgentId,
    pub age: f64,
    pub sex: Sex,
    pub household: GroupId,
    pub workplace: Option<GroupId>,
    pub school: Option<GroupId>,
    pub health: Health,
    pub rng: AgentRng,
}

impl Person {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: PersonId,
        index: AgentId,
        age: f64,
        sex: Sex,
        household: GroupId,
        workplace: Option<GroupId>,
        school: Option<GroupId>,
        global_seed: u64,
        conditions: &ConditionSet,
    ) -> Self {
        // Stream keyed by the permanent id: a recycled slot's new
        // occupant is decorrelated from the previous one.
        let mut rng = AgentRng::new(global_seed, id.0);
        let mut health = Health::new(id, household, conditions);
        for condition in conditions.ids() {
            if let Some(map) = &conditions.get(condition).params().at_risk {
                if rng.gen_bool(map.find_value(age)) {
                    health.declare_at_risk(condition);
                }
            }
        }
        Self { id, index, age, sex, household, workplace, school, health, rng }
    }

    pub fn is_alive(&self) -> bool {
        self.health.is_alive()
    }
}

impl Default for Person {
    /// Placeholder for a reset arena slot; never observable through
    /// the population API because every allocation overwrites it.
    fn default() -> Self {
        Self {
            id: PersonId::INVALID,
            index: AgentId::INVALID,
            age: 0.0,
            sex: Sex::Female,
            household: GroupId::INVALID,
            workplace: None,
            school: None,
            health: Health::default(),
            rng: AgentRng::new(0, 0),
        }
    }
}
