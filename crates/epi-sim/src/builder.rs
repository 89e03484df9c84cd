//! Fluent builder for constructing a [`Simulation`].

use epi_core::SimConfig;
use epi_health::ConditionSet;

use crate::models::{
    BehaviorModel, DemographicsModel, NoopBehavior, NoopDemographics, NoopTravel, TravelModel,
};
use crate::population::Population;
use crate::sim::Simulation;
use crate::{SimError, SimResult};

/// Fluent builder for [`Simulation<D, T, B>`].
///
/// Starts with no-op demographics, travel, and behavior models; swap
/// any of them in before `build`.
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, conditions)
///     .demographics(VitalRates::from_file("rates.csv")?)
///     .build()?;
/// load_population_file("people.csv", &mut sim.population)?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<D, T, B> {
    config: SimConfig,
    conditions: ConditionSet,
    demographics: D,
    travel: T,
    behavior: B,
}

impl SimBuilder<NoopDemographics, NoopTravel, NoopBehavior> {
    pub fn new(config: SimConfig, conditions: ConditionSet) -> Self {
        Self {
            config,
            conditions,
            demographics: NoopDemographics,
            travel: NoopTravel,
            behavior: NoopBehavior,
        }
    }
}

impl<D, T, B> SimBuilder<D, T, B> {
    /// Replace the demographics model.
    pub fn demographics<D2>(self, demographics: D2) -> SimBuilder<D2, T, B> {
        SimBuilder {
            config: self.config,
            conditions: self.conditions,
            demographics,
            travel: self.travel,
            behavior: self.behavior,
        }
    }

    /// Replace the travel model.
    pub fn travel<T2>(self, travel: T2) -> SimBuilder<D, T2, B> {
        SimBuilder {
            config: self.config,
            conditions: self.conditions,
            demographics: self.demographics,
            travel,
            behavior: self.behavior,
        }
    }

    /// Replace the behavior model.
    pub fn behavior<B2>(self, behavior: B2) -> SimBuilder<D, T, B2> {
        SimBuilder {
            config: self.config,
            conditions: self.conditions,
            demographics: self.demographics,
            travel: self.travel,
            behavior,
        }
    }

    /// Turn on serotype cross-immunity between the registered
    /// conditions.
    pub fn cross_immunity(mut self, enabled: bool) -> Self {
        self.conditions.cross_immunity = enabled;
        self
    }

    /// Validate the configuration and return a ready-to-run
    /// [`Simulation`] with an empty population.
    pub fn build(self) -> SimResult<Simulation<D, T, B>>
    where
        D: DemographicsModel,
        T: TravelModel,
        B: BehaviorModel,
    {
        if self.conditions.is_empty() {
            return Err(SimError::Config("at least one condition must be registered".into()));
        }

        #[cfg(feature = "parallel")]
        if let Some(threads) = self.config.num_threads {
            // First builder wins; later sims in the same process reuse
            // the existing global pool.
            if rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .is_err()
            {
                log::warn!("global thread pool already initialized; num_threads ignored");
            }
        }

        let population = Population::new(self.conditions, self.config.seed);
        Ok(Simulation::new(
            self.config,
            population,
            self.demographics,
            self.travel,
            self.behavior,
        ))
    }
}
