//! Model traits the day loop calls between bulk passes.
//!
//! Each trait owns one lifecycle concern.  Implementations run with
//! exclusive access to the population, so they may use the masked
//! passes directly (the birth and death candidate masks exist for
//! exactly that) or mutate agents one at a time.  No-op defaults let a
//! pure epidemic run skip demographics entirely.

use epi_core::Day;

use crate::population::Population;

/// Births and deaths from causes other than infection.
pub trait DemographicsModel {
    /// Decide today's deliveries; enqueue each mother via
    /// [`Population::enqueue_birth`].
    fn update_births(&mut self, population: &mut Population, day: Day);

    /// Decide today's background mortality; enqueue victims on the
    /// population's removal queue.
    fn update_deaths(&mut self, population: &mut Population, day: Day);
}

/// Agent movement between mixing groups.
pub trait TravelModel {
    fn update_travel(&mut self, population: &mut Population, day: Day);
}

/// Daily behavior adjustments (staying home when sick, and the like).
pub trait BehaviorModel {
    fn update_behavior(&mut self, population: &mut Population, day: Day);
}

/// Static population: nobody is born, nobody dies of old age.
pub struct NoopDemographics;

impl DemographicsModel for NoopDemographics {
    fn update_births(&mut self, _population: &mut Population, _day: Day) {}
    fn update_deaths(&mut self, _population: &mut Population, _day: Day) {}
}

/// Nobody travels.
pub struct NoopTravel;

impl TravelModel for NoopTravel {
    fn update_travel(&mut self, _population: &mut Population, _day: Day) {}
}

/// No behavioral response.
pub struct NoopBehavior;

impl BehaviorModel for NoopBehavior {
    fn update_behavior(&mut self, _population: &mut Population, _day: Day) {}
}
