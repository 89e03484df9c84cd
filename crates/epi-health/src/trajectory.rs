//! Daily infectivity/symptomaticity curves.
//!
//! A [`Trajectory`] is a dense per-day curve starting at the day of
//! exposure (offset 0). Offsets outside the curve read as zero, which
//! is what lets the milestone scan in `infection` treat the day after
//! the last point as recovery.

/// One day of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrajectoryPoint {
    pub infectivity: f64,
    pub symptomaticity: f64,
}

impl TrajectoryPoint {
    pub const fn new(infectivity: f64, symptomaticity: f64) -> Self {
        Self { infectivity, symptomaticity }
    }
}

/// Dense daily curve from exposure to recovery.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn new(points: Vec<TrajectoryPoint>) -> Self {
        Self { points }
    }

    /// Builds a curve from parallel infectivity/symptomaticity slices,
    /// padding the shorter one with zeros.
    pub fn from_curves(infectivity: &[f64], symptomaticity: &[f64]) -> Self {
        let len = infectivity.len().max(symptomaticity.len());
        let points = (0..len)
            .map(|i| TrajectoryPoint {
                infectivity: infectivity.get(i).copied().unwrap_or(0.0),
                symptomaticity: symptomaticity.get(i).copied().unwrap_or(0.0),
            })
            .collect();
        Self { points }
    }

    /// Number of days the curve covers. The day at offset `duration()`
    /// is the first day fully past the curve.
    pub fn duration(&self) -> usize {
        self.points.len()
    }

    /// Point at `offset` days since exposure; zero outside the curve.
    pub fn point(&self, offset: i32) -> TrajectoryPoint {
        if offset < 0 {
            return TrajectoryPoint::default();
        }
        self.points.get(offset as usize).copied().unwrap_or_default()
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    /// Rewrites the symptomatic tail starting at `from` to span
    /// `new_len` days, resampling the existing tail proportionally.
    pub(crate) fn rewrite_symptomatic_tail(&mut self, from: usize, new_len: usize) {
        let old_tail: Vec<TrajectoryPoint> = self.points[from.min(self.points.len())..].to_vec();
        self.points.truncate(from);
        if old_tail.is_empty() {
            return;
        }
        for i in 0..new_len {
            // Proportional resample: stretch or shrink the old tail.
            let src = i * old_tail.len() / new_len.max(1);
            self.points.push(old_tail[src.min(old_tail.len() - 1)]);
        }
    }

    /// Rewrites the span before symptom onset (the asymptomatic run
    /// starting at `from`) to `new_len` days, keeping the symptomatic
    /// tail that started at `symp_offset` intact after it.
    pub(crate) fn rewrite_asymptomatic_span(
        &mut self,
        from: usize,
        new_len: usize,
        symp_offset: usize,
    ) {
        let tail: Vec<TrajectoryPoint> =
            self.points[symp_offset.min(self.points.len())..].to_vec();
        let old_span: Vec<TrajectoryPoint> =
            self.points[from.min(self.points.len())..symp_offset.min(self.points.len())].to_vec();
        self.points.truncate(from);
        if !old_span.is_empty() {
            for i in 0..new_len {
                let src = i * old_span.len() / new_len.max(1);
                self.points.push(old_span[src.min(old_span.len() - 1)]);
            }
        }
        self.points.extend(tail);
    }

    /// Grafts a symptomatic tail onto a curve that had none: from
    /// `symp_offset` onward, `symp_len` days copy the infectivity of
    /// the final existing point and carry symptomaticity 1.0.
    pub(crate) fn set_develops_symptoms(&mut self, symp_offset: usize, symp_len: usize) {
        let template = self.points.last().copied().unwrap_or_default();
        self.points.truncate(symp_offset);
        while self.points.len() < symp_offset {
            self.points.push(template);
        }
        for _ in 0..symp_len {
            self.points.push(TrajectoryPoint {
                infectivity: template.infectivity,
                symptomaticity: 1.0,
            });
        }
    }
}
