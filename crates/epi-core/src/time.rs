//! Simulation time model.
//!
//! The epidemic model is day-granular: every state transition, milestone
//! date, and bulk pass is keyed by an absolute simulated [`Day`].  Using an
//! integer day as the canonical time unit keeps all date arithmetic exact
//! and comparisons O(1).
//!
//! Days are signed: seed infections are advanced *before* day zero, so an
//! exposure date may legitimately be negative.

use std::fmt;

// ── Day ───────────────────────────────────────────────────────────────────────

/// An absolute simulated day.  Day 0 is the first day of the run.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Day(pub i32);

impl Day {
    pub const ZERO: Day = Day(0);

    /// Horizon used for "effectively never" recovery dates (chronic or
    /// trajectory-less infections): roughly a thousand simulated years.
    pub const FAR_HORIZON: i32 = 366_000;

    /// The day `n` days after `self` (`n` may be negative).
    #[inline]
    pub fn offset(self, n: i32) -> Day {
        Day(self.0 + n)
    }

    /// Days elapsed from `earlier` to `self` (negative if `earlier` is later).
    #[inline]
    pub fn since(self, earlier: Day) -> i32 {
        self.0 - earlier.0
    }
}

impl std::ops::Add<i32> for Day {
    type Output = Day;
    #[inline]
    fn add(self, rhs: i32) -> Day {
        Day(self.0 + rhs)
    }
}

impl std::ops::Sub for Day {
    type Output = i32;
    #[inline]
    fn sub(self, rhs: Day) -> i32 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {}", self.0)
    }
}
