//! Uniform time grid the integrator walks.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Relative slack when counting whole steps in the grid span.
/// `0.3 / 0.1` is `2.9999999999999996` in f64 and should count as 3.
const STEP_COUNT_TOLERANCE: f64 = 1e-9;

/// Largest number of steps a grid may span.
pub const MAX_STEPS: usize = 10_000_000;

/// Spacing that still separates neighbouring grid times, in units of
/// `f64::EPSILON` times the largest time magnitude on the grid.
const RESOLUTION_ULPS: f64 = 4.0;

/// `start, start + step, ..., start + n * step` with `start + n * step <= end`
/// (up to floating-point slack).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl TimeGrid {
    /// Build and validate a grid.
    pub fn new(start: f64, end: f64, step: f64) -> Result<Self> {
        let grid = Self { start, end, step };
        match grid.validate().into_iter().next() {
            Some(e) => Err(e.into()),
            None => Ok(grid),
        }
    }

    /// Collect every reason the grid cannot be walked. Size and resolution
    /// are only checked once the bounds and step are individually sound.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if !self.start.is_finite() || !self.end.is_finite() {
            errors.push(ConfigError::NonFiniteGrid);
        }
        if !(self.step > 0.0 && self.step.is_finite()) {
            errors.push(ConfigError::NonPositiveStep(self.step));
        }
        if self.end < self.start {
            errors.push(ConfigError::EndBeforeStart {
                start: self.start,
                end: self.end,
            });
        }
        if !errors.is_empty() {
            return errors;
        }

        let span = self.span();
        if !span.is_finite() || span > MAX_STEPS as f64 {
            errors.push(ConfigError::TooManySteps {
                span,
                max: MAX_STEPS,
            });
            return errors;
        }

        let steps = self.steps();
        if steps > 0 {
            let last = self.time_at(steps);
            let magnitude = self.start.abs().max(last.abs());
            let resolved = self.step > RESOLUTION_ULPS * f64::EPSILON * magnitude
                && self.time_at(1) > self.start
                && last > self.time_at(steps - 1);
            if !resolved {
                let time = if self.start.abs() > last.abs() {
                    self.start
                } else {
                    last
                };
                errors.push(ConfigError::UnresolvableStep {
                    step: self.step,
                    time,
                });
            }
        }
        errors
    }

    fn span(&self) -> f64 {
        (self.end - self.start) / self.step
    }

    /// Number of whole steps between `start` and `end`. Saturates at
    /// [`MAX_STEPS`] for grids that would fail validation.
    pub fn steps(&self) -> usize {
        let span = self.span();
        if span.is_nan() || span <= 0.0 {
            return 0;
        }
        let counted = (span + span.max(1.0) * STEP_COUNT_TOLERANCE).floor();
        if counted >= MAX_STEPS as f64 {
            MAX_STEPS
        } else {
            counted as usize
        }
    }

    /// Number of grid points, `steps() + 1`.
    pub fn len(&self) -> usize {
        self.steps() + 1
    }

    /// Never empty: the start point is always on the grid.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Time of grid point `index`. Computed from the index so rounding
    /// does not accumulate over long runs.
    pub fn time_at(&self, index: usize) -> f64 {
        self.start + index as f64 * self.step
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(move |i| self.time_at(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_grid_has_1001_points() {
        let grid = TimeGrid::new(0.0, 100.0, 0.1).unwrap();
        assert_eq!(grid.len(), 1001);
        assert_eq!(grid.time_at(0), 0.0);
        assert!((grid.time_at(1000) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_inexact_division_still_counts_whole_steps() {
        let grid = TimeGrid::new(0.0, 0.3, 0.1).unwrap();
        assert_eq!(grid.len(), 4);
    }

    #[test]
    fn test_partial_last_step_is_dropped() {
        // floor(1.0 / 0.3) + 1 = 4
        let grid = TimeGrid::new(0.0, 1.0, 0.3).unwrap();
        assert_eq!(grid.len(), 4);
        assert!(grid.time_at(3) <= 1.0);
    }

    #[test]
    fn test_degenerate_grid_is_single_point() {
        let grid = TimeGrid::new(5.0, 5.0, 0.5).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.times().collect::<Vec<_>>(), vec![5.0]);
    }

    #[test]
    fn test_times_strictly_increasing() {
        let grid = TimeGrid::new(-2.0, 3.0, 0.25).unwrap();
        let times: Vec<f64> = grid.times().collect();
        assert_eq!(times.len(), 21);
        assert!(times.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_rejects_non_positive_step() {
        assert!(TimeGrid::new(0.0, 1.0, 0.0).is_err());
        assert!(TimeGrid::new(0.0, 1.0, -0.1).is_err());
        assert!(TimeGrid::new(0.0, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_rejects_reversed_grid() {
        let grid = TimeGrid {
            start: 10.0,
            end: 0.0,
            step: 0.1,
        };
        assert_eq!(
            grid.validate(),
            vec![ConfigError::EndBeforeStart {
                start: 10.0,
                end: 0.0
            }]
        );
    }

    #[test]
    fn test_rejects_step_below_f64_resolution() {
        // Near 1e17 neighbouring f64 values are 16 apart, so a step of 1
        // would repeat times.
        let err = TimeGrid::new(1e17, 1e17 + 10.0, 1.0).unwrap_err();
        assert!(matches!(
            err,
            crate::SimError::Config(ConfigError::UnresolvableStep { step, .. }) if step == 1.0
        ));

        let grid = TimeGrid {
            start: -1e17,
            end: -1e17 + 64.0,
            step: 1.0,
        };
        assert!(matches!(
            grid.validate().as_slice(),
            [ConfigError::UnresolvableStep { .. }]
        ));
    }

    #[test]
    fn test_single_point_far_from_origin_is_fine() {
        let grid = TimeGrid::new(1e17, 1e17, 1.0).unwrap();
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_coarse_step_far_from_origin_is_fine() {
        let grid = TimeGrid::new(1e6, 1e6 + 1.0, 0.25).unwrap();
        let times: Vec<f64> = grid.times().collect();
        assert_eq!(times.len(), 5);
        assert!(times.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_rejects_oversized_grids() {
        for (start, end, step) in [(0.0, 1e20, 1e-5), (0.0, 1e12, 1e-3)] {
            let grid = TimeGrid { start, end, step };
            assert!(
                matches!(
                    grid.validate().as_slice(),
                    [ConfigError::TooManySteps { max: MAX_STEPS, .. }]
                ),
                "grid {start}..{end} step {step}"
            );
            assert_eq!(grid.len(), MAX_STEPS + 1);
        }
    }

    #[test]
    fn test_rejects_span_that_overflows() {
        let grid = TimeGrid {
            start: -1e308,
            end: 1e308,
            step: 1.0,
        };
        match grid.validate().as_slice() {
            [ConfigError::TooManySteps { span, .. }] => assert!(span.is_infinite()),
            other => panic!("unexpected errors: {other:?}"),
        }
        assert!(TimeGrid::new(-1e308, 1e308, 1.0).is_err());
    }

    #[test]
    fn test_largest_allowed_grid_validates() {
        let grid = TimeGrid::new(0.0, MAX_STEPS as f64, 1.0).unwrap();
        assert_eq!(grid.steps(), MAX_STEPS);
    }

    #[test]
    fn test_rejects_non_finite_bounds() {
        let errors = TimeGrid {
            start: 0.0,
            end: f64::INFINITY,
            step: 1.0,
        }
        .validate();
        assert_eq!(errors, vec![ConfigError::NonFiniteGrid]);
    }
}
