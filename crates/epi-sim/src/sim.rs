//! The `Simulation` struct and its day loop.

use epi_core::{AgentId, ConditionId, Day, SimConfig};
use epi_health::{ExposureOutcome, MixingGroupBoard, SharedGroupBoard};

use crate::models::{BehaviorModel, DemographicsModel, TravelModel};
use crate::observer::{DayStats, SimObserver};
use crate::population::Population;
use crate::SimResult;

/// The main simulation runner.
///
/// `Simulation<D, T, B>` owns the population and drives the fixed
/// daily pass order:
///
/// 1. **Births** — `D::update_births` selects mothers; the maternity
///    queue is drained and newborns admitted (serial).
/// 2. **Deaths** — `D::update_deaths` enqueues background mortality;
///    the removal queue is drained (serial).
/// 3. **Health** — the masked health pass advances every active
///    infection (parallel with the `parallel` feature), then the
///    removal queue is drained again so case fatalities raised during
///    the pass free their slots before the next day.
/// 4. **Travel** — `T::update_travel`.
/// 5. **Behavior** — `B::update_behavior`.
///
/// The order is fixed: every pass observes the completed effects of
/// the passes before it and none of the effects of those after it.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Simulation<D, T, B> {
    pub config: SimConfig,
    pub population: Population,
    /// Per-group daily tallies, reset at each day boundary.
    pub board: SharedGroupBoard,
    pub demographics: D,
    pub travel: T,
    pub behavior: B,
    current_day: Day,
}

impl<D, T, B> Simulation<D, T, B>
where
    D: DemographicsModel,
    T: TravelModel,
    B: BehaviorModel,
{
    pub(crate) fn new(
        config: SimConfig,
        population: Population,
        demographics: D,
        travel: T,
        behavior: B,
    ) -> Self {
        Self {
            config,
            population,
            board: SharedGroupBoard::new(),
            demographics,
            travel,
            behavior,
            current_day: Day::ZERO,
        }
    }

    pub fn current_day(&self) -> Day {
        self.current_day
    }

    /// Plants an imported case already `days_elapsed` days into its
    /// course.  Call before [`run`][Self::run].
    pub fn seed_infection(
        &mut self,
        condition: ConditionId,
        agent: AgentId,
        days_elapsed: i32,
    ) -> SimResult<ExposureOutcome> {
        Ok(self
            .population
            .seed_infection(&self.board, condition, agent, days_elapsed)?)
    }

    /// Runs from the current day to `config.end_day()`, invoking
    /// observer hooks at every day boundary.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.current_day < self.config.end_day() {
            let day = self.current_day;
            observer.on_day_start(day, &self.population);
            let stats = self.process_day(day)?;
            observer.on_day_end(day, &stats, &self.population);
            self.current_day = day.offset(1);
        }
        observer.on_sim_end(self.current_day);
        Ok(())
    }

    /// Runs exactly `n` days from the current position (ignores
    /// `end_day`).  Useful for tests and incremental stepping.
    pub fn run_days<O: SimObserver>(&mut self, n: u32, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            let day = self.current_day;
            observer.on_day_start(day, &self.population);
            let stats = self.process_day(day)?;
            observer.on_day_end(day, &stats, &self.population);
            self.current_day = day.offset(1);
        }
        Ok(())
    }

    // ── Core day processing ───────────────────────────────────────────────────

    fn process_day(&mut self, day: Day) -> SimResult<DayStats> {
        log::debug!("processing {day}");
        self.board.reset();

        // ── Phase 1: births ───────────────────────────────────────────────
        self.demographics.update_births(&mut self.population, day);
        self.population.deliver_births(day)?;

        // ── Phase 2: background mortality ─────────────────────────────────
        self.demographics.update_deaths(&mut self.population, day);
        self.population.drain_removals();

        // ── Phase 3: health pass, then free its case fatalities ───────────
        self.population.run_health_pass(day, &self.board);
        self.population.drain_removals();

        // ── Phase 4: travel ───────────────────────────────────────────────
        self.travel.update_travel(&mut self.population, day);

        // ── Phase 5: behavior ─────────────────────────────────────────────
        self.behavior.update_behavior(&mut self.population, day);

        let counters = self.population.take_counters();
        Ok(DayStats {
            day,
            new_infections: counters.new_infections,
            new_symptomatic: counters.new_symptomatic,
            current_infectious: self.population.current_infectious(),
            deaths: counters.deaths,
            births: counters.births,
            population: self.population.len(),
        })
    }
}
