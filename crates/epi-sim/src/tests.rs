//! Unit tests for epi-sim.

use epi_core::{AgentId, ConditionId, Day, GroupId, PersonId, SimConfig};
use epi_health::{
    ConditionParams, ConditionSet, ExposureOutcome, LifecycleHost, ParamCondition, Trajectory,
};

use crate::builder::SimBuilder;
use crate::loader::load_population_reader;
use crate::models::{DemographicsModel, NoopBehavior, NoopDemographics, NoopTravel};
use crate::observer::{NoopObserver, StatsCollector};
use crate::person::Sex;
use crate::population::Population;
use crate::sim::Simulation;

// ── Fixtures ──────────────────────────────────────────────────────────────────

const FLU: ConditionId = ConditionId(0);

/// Six-day course: infectious onset one day after exposure, symptom
/// onset after three, recovery after six.
fn flu_trajectory() -> Trajectory {
    Trajectory::from_curves(
        &[0.0, 0.5, 0.5, 0.5, 0.5, 0.5],
        &[0.0, 0.0, 0.0, 0.6, 0.6, 0.6],
    )
}

fn flu() -> ParamCondition {
    let params = ConditionParams {
        name: "flu".into(),
        infectivity_threshold: 0.0,
        symptomaticity_threshold: 0.5,
        ..ConditionParams::default()
    };
    ParamCondition::new(params, flu_trajectory())
}

fn conditions_with(condition: ParamCondition) -> ConditionSet {
    let mut set = ConditionSet::new();
    set.register(Box::new(condition));
    set
}

fn config(days: u32) -> SimConfig {
    SimConfig { days, seed: 42, ..SimConfig::default() }
}

type TestSim = Simulation<NoopDemographics, NoopTravel, NoopBehavior>;

fn sim_with(days: u32, condition: ParamCondition, people: usize) -> (TestSim, Vec<AgentId>) {
    let mut sim = SimBuilder::new(config(days), conditions_with(condition))
        .build()
        .unwrap();
    let agents = (0..people)
        .map(|i| {
            sim.population
                .add_person(30.0, Sex::Female, GroupId(i as u32 / 4), None, None)
                .unwrap()
        })
        .collect();
    (sim, agents)
}

// ── Population store ──────────────────────────────────────────────────────────

#[cfg(test)]
mod population_store {
    use super::*;

    #[test]
    fn admission_assigns_fresh_ids_and_susceptible_mask() {
        let mut pop = Population::new(conditions_with(flu()), 42);
        let a = pop.add_person(30.0, Sex::Female, GroupId(1), None, None).unwrap();
        let b = pop.add_person(8.0, Sex::Male, GroupId(1), None, Some(GroupId(9))).unwrap();

        assert_eq!(pop.person(a).unwrap().id, PersonId(0));
        assert_eq!(pop.person(b).unwrap().id, PersonId(1));
        assert!(pop.arena().has_mask(pop.masks().susceptible, a));
        assert_eq!(pop.person(b).unwrap().school, Some(GroupId(9)));
        assert_eq!(pop.len(), 2);
    }

    #[test]
    fn recycled_slot_gets_a_fresh_person_id() {
        let mut pop = Population::new(conditions_with(flu()), 42);
        let a = pop.add_person(30.0, Sex::Female, GroupId(1), None, None).unwrap();
        let _b = pop.add_person(40.0, Sex::Male, GroupId(2), None, None).unwrap();

        pop.removals().enqueue_for_removal(Day(0), a);
        assert_eq!(pop.drain_removals(), vec![PersonId(0)]);
        assert_eq!(pop.len(), 1);

        let c = pop.add_person(0.0, Sex::Female, GroupId(1), None, None).unwrap();
        // Same slot, new permanent identity.
        assert_eq!(c, a);
        assert_eq!(pop.person(c).unwrap().id, PersonId(2));
    }

    #[test]
    fn at_risk_ages_are_flagged_on_admission() {
        let params = ConditionParams {
            at_risk: Some(epi_health::AgeMap::constant(1.0)),
            ..ConditionParams::default()
        };
        let condition = ParamCondition::new(params, flu_trajectory());
        let mut pop = Population::new(conditions_with(condition), 42);
        let a = pop.add_person(70.0, Sex::Male, GroupId(1), None, None).unwrap();
        assert!(pop.person(a).unwrap().health.is_at_risk(FLU));
    }

    #[test]
    fn double_enqueued_removal_frees_once() {
        let mut pop = Population::new(conditions_with(flu()), 42);
        let a = pop.add_person(30.0, Sex::Female, GroupId(1), None, None).unwrap();
        pop.removals().enqueue_for_removal(Day(0), a);
        pop.removals().enqueue_for_removal(Day(0), a);
        assert_eq!(pop.drain_removals(), vec![PersonId(0)]);
        assert!(pop.is_empty());
    }
}

// ── Population file loading ───────────────────────────────────────────────────

#[cfg(test)]
mod loading {
    use super::*;

    #[test]
    fn loads_rows_in_order_with_optional_groups() {
        let csv = "\
age,sex,household_id,workplace_id,school_id
34.0,F,12,400,
8.5,M,12,,71
";
        let mut pop = Population::new(conditions_with(flu()), 42);
        let n = load_population_reader(csv.as_bytes(), &mut pop).unwrap();
        assert_eq!(n, 2);

        let adult = pop.person(AgentId(0)).unwrap();
        assert_eq!(adult.sex, Sex::Female);
        assert_eq!(adult.household, GroupId(12));
        assert_eq!(adult.workplace, Some(GroupId(400)));
        assert_eq!(adult.school, None);

        let child = pop.person(AgentId(1)).unwrap();
        assert_eq!(child.school, Some(GroupId(71)));
        assert_eq!(child.workplace, None);
    }

    #[test]
    fn unknown_sex_code_is_an_error() {
        let csv = "age,sex,household_id,workplace_id,school_id\n30.0,X,1,,\n";
        let mut pop = Population::new(conditions_with(flu()), 42);
        assert!(load_population_reader(csv.as_bytes(), &mut pop).is_err());
    }

    #[test]
    fn negative_age_is_an_error() {
        let csv = "age,sex,household_id,workplace_id,school_id\n-1.0,F,1,,\n";
        let mut pop = Population::new(conditions_with(flu()), 42);
        assert!(load_population_reader(csv.as_bytes(), &mut pop).is_err());
    }
}

// ── Exposure bookkeeping ──────────────────────────────────────────────────────

#[cfg(test)]
mod exposure {
    use super::*;

    #[test]
    fn exposure_credits_infector_and_counts_once() {
        let (mut sim, agents) = sim_with(10, flu(), 2);
        let (source, target) = (agents[0], agents[1]);
        sim.seed_infection(FLU, source, 1).unwrap();

        let outcome = sim
            .population
            .expose(&sim.board, FLU, target, Some(source), Some(GroupId(0)), Day(0))
            .unwrap();
        assert_eq!(outcome, ExposureOutcome::Infected);

        let src = sim.population.person(source).unwrap();
        assert_eq!(src.health.infectee_count(FLU), 1);
        let tgt = sim.population.person(target).unwrap();
        assert_eq!(tgt.health.infector(FLU), Some(src.id));

        let counters = sim.population.take_counters();
        // One from the seed, one from the contact exposure.
        assert_eq!(counters.new_infections, 2);
        // The seed carries no group; only the contact exposure lands in
        // group 0's tally, counted once at exposure time.
        assert_eq!(sim.board.tally(GroupId(0), FLU).new_infections, 1);
    }

    #[test]
    fn repeated_health_pass_does_not_double_group_tallies() {
        let (mut sim, agents) = sim_with(10, flu(), 1);
        sim.seed_infection(FLU, agents[0], 0).unwrap();

        // Infectious onset is one day after exposure.
        sim.population.run_health_pass(Day(1), &sim.board);
        sim.population.run_health_pass(Day(1), &sim.board);
        assert_eq!(sim.board.tally(GroupId(0), FLU).infectious, 1);
    }
}

// ── Day loop ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod day_loop {
    use super::*;

    #[test]
    fn seeded_course_shows_up_in_daily_stats() {
        let (mut sim, agents) = sim_with(7, flu(), 1);
        sim.seed_infection(FLU, agents[0], 0).unwrap();

        let mut stats = StatsCollector::default();
        sim.run(&mut stats).unwrap();
        let days = &stats.days;
        assert_eq!(days.len(), 7);

        assert_eq!(days[0].new_infections, 1);
        assert_eq!(days[0].current_infectious, 0);
        assert_eq!(days[1].current_infectious, 1);
        assert_eq!(days[3].new_symptomatic, 1);
        assert_eq!(days[5].current_infectious, 1);
        // Recovery on day 6 clears the infectious standing.
        assert_eq!(days[6].current_infectious, 0);
        assert_eq!(days[6].population, 1);

        let person = sim.population.person(agents[0]).unwrap();
        assert!(person.health.has_recovered(FLU));
        assert!(person.health.is_immune(FLU));
    }

    // A case fatality stays a valid store resident through the rest of
    // its final day's passes and is freed before the next day begins.
    #[test]
    fn case_fatality_is_freed_between_days() {
        let (mut sim, agents) = sim_with(10, flu().with_case_fatality(1.0), 1);
        let victim = agents[0];
        sim.seed_infection(FLU, victim, 0).unwrap();

        let mut stats = StatsCollector::default();
        // Symptom onset (day 3) makes the fatality draw certain.
        sim.run_days(3, &mut stats).unwrap();
        assert!(sim.population.arena().is_valid(victim));

        sim.run_days(1, &mut stats).unwrap();
        assert_eq!(stats.days[3].deaths, 1);
        assert!(!sim.population.arena().is_valid(victim));
        assert!(sim.population.is_empty());
        assert!(sim.population.removals().is_empty());
    }

    #[test]
    fn background_mortality_drains_before_the_health_pass() {
        struct Reaper {
            victim: AgentId,
            on: Day,
        }
        impl DemographicsModel for Reaper {
            fn update_births(&mut self, _p: &mut Population, _d: Day) {}
            fn update_deaths(&mut self, p: &mut Population, day: Day) {
                if day == self.on {
                    p.removals().enqueue_for_removal(day, self.victim);
                }
            }
        }

        let mut sim = SimBuilder::new(config(5), conditions_with(flu()))
            .demographics(Reaper { victim: AgentId(0), on: Day(2) })
            .build()
            .unwrap();
        let victim = sim
            .population
            .add_person(80.0, Sex::Male, GroupId(0), None, None)
            .unwrap();
        assert_eq!(victim, AgentId(0));

        let mut stats = StatsCollector::default();
        sim.run(&mut stats).unwrap();
        assert_eq!(stats.days[2].deaths, 1);
        assert_eq!(stats.days[2].population, 0);
    }

    #[test]
    fn queued_birth_is_delivered_same_day() {
        struct OneBirth {
            mother: AgentId,
            on: Day,
        }
        impl DemographicsModel for OneBirth {
            fn update_births(&mut self, p: &mut Population, day: Day) {
                if day == self.on {
                    p.enqueue_birth(self.mother);
                }
            }
            fn update_deaths(&mut self, _p: &mut Population, _d: Day) {}
        }

        let mut sim = SimBuilder::new(config(4), conditions_with(flu()))
            .demographics(OneBirth { mother: AgentId(0), on: Day(2) })
            .build()
            .unwrap();
        let mother = sim
            .population
            .add_person(28.0, Sex::Female, GroupId(7), None, None)
            .unwrap();

        let mut stats = StatsCollector::default();
        sim.run(&mut stats).unwrap();
        assert_eq!(stats.days[2].births, 1);
        assert_eq!(stats.days[2].population, 2);

        let baby = sim.population.person(AgentId(1)).unwrap();
        assert_eq!(baby.age, 0.0);
        assert_eq!(baby.household, sim.population.person(mother).unwrap().household);
        assert_eq!(baby.id, PersonId(1));
    }
}

// ── Determinism ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod determinism {
    use super::*;

    fn run_once() -> Vec<crate::observer::DayStats> {
        let condition = flu().with_immune_response(0.3).with_case_fatality(0.1);
        let (mut sim, agents) = sim_with(15, condition, 20);
        for &agent in agents.iter().take(5) {
            sim.seed_infection(FLU, agent, 1).unwrap();
        }
        // Spread a second wave by contact from the first seed.
        for &agent in agents.iter().skip(5).take(5) {
            sim.population
                .expose(&sim.board, FLU, agent, Some(agents[0]), None, Day(0))
                .unwrap();
        }
        let mut stats = StatsCollector::default();
        sim.run(&mut stats).unwrap();
        stats.days
    }

    #[test]
    fn identical_seeds_replay_identically() {
        assert_eq!(run_once(), run_once());
    }

    #[test]
    fn builder_rejects_empty_condition_set() {
        assert!(SimBuilder::new(config(1), ConditionSet::new()).build().is_err());
    }
}

// ── Observer plumbing ─────────────────────────────────────────────────────────

#[cfg(test)]
mod observer {
    use super::*;

    #[test]
    fn run_advances_to_end_day_exclusive() {
        let (mut sim, _) = sim_with(3, flu(), 0);
        sim.run(&mut NoopObserver).unwrap();
        assert_eq!(sim.current_day(), Day(3));
    }
}
