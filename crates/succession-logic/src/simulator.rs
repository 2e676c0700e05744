//! Driver loop: walks the time grid with RK4 and emits one snapshot per
//! grid point.
//!
//! A [`Simulation`] is an iterator of snapshots and moves through three
//! phases:
//!
//! ```text
//! NotStarted --first next()--> Stepping --last grid point--> Completed
//! ```
//!
//! The first snapshot is the initial state at `t_0`. Every later snapshot
//! is one RK4 step past the previous one, with growth rates and resource
//! re-evaluated at the new populations. Any non-finite population, rate or
//! resource ends the run with an error naming the step and species.

use std::iter::FusedIterator;

use crate::derivative::derivative;
use crate::error::{Result, SimError};
use crate::grid::TimeGrid;
use crate::integrator::Rk4Stepper;
use crate::params::{check_model, plausibility_warnings, ModelConfig, PopulationState};
use crate::trajectory::{SimulationSnapshot, Trajectory};

/// Upper bound on the snapshots reserved up front by [`Simulation::collect_trajectory`].
const PREALLOCATE_LIMIT: usize = 1 << 16;

/// Where a simulation is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Stepping,
    Completed,
}

/// Incremental, single-owner run over a validated configuration.
#[derive(Debug, Clone)]
pub struct Simulation<'a> {
    config: &'a ModelConfig,
    grid: TimeGrid,
    state: PopulationState,
    stepper: Rk4Stepper,
    /// Grid index of the next snapshot to emit.
    next_index: usize,
    len: usize,
    phase: Phase,
}

impl<'a> Simulation<'a> {
    /// Validate inputs and prepare a run. Rejects the configuration before
    /// any step executes; plausibility concerns are only logged.
    pub fn new(config: &'a ModelConfig, initial: &[f64], grid: &TimeGrid) -> Result<Self> {
        check_model(config, initial)?;
        if let Some(e) = grid.validate().into_iter().next() {
            return Err(e.into());
        }

        for warning in plausibility_warnings(config, initial) {
            log::warn!("{}", warning);
        }

        let len = grid.len();
        log::debug!(
            "Simulation prepared: {} species, {} grid points, t = {}..{} step {}",
            config.species_count(),
            len,
            grid.start,
            grid.end,
            grid.step
        );

        Ok(Self {
            config,
            grid: *grid,
            state: initial.to_vec(),
            stepper: Rk4Stepper::new(initial.len()),
            next_index: 0,
            len,
            phase: Phase::NotStarted,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Populations as of the most recent snapshot.
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Snapshots still to come.
    pub fn remaining(&self) -> usize {
        match self.phase {
            Phase::Completed => 0,
            _ => self.len - self.next_index,
        }
    }

    /// Drain the rest of the run into a trajectory.
    pub fn collect_trajectory(self) -> Result<Trajectory> {
        let capacity = self.remaining().min(PREALLOCATE_LIMIT);
        let mut trajectory = Trajectory::with_capacity(self.config.species_names(), capacity);
        for snapshot in self {
            trajectory.push(snapshot?);
        }
        Ok(trajectory)
    }

    fn advance(&mut self) -> Result<SimulationSnapshot> {
        let index = self.next_index;
        if index > 0 {
            let t = self.grid.time_at(index - 1);
            self.stepper
                .step(self.config, &mut self.state, t, self.grid.step);
        }
        let time = self.grid.time_at(index);
        log::trace!("step {} t = {} populations = {:?}", index, time, self.state);

        for (species, &value) in self.state.iter().enumerate() {
            if !value.is_finite() {
                return Err(SimError::NonFinite {
                    step: index,
                    time,
                    species,
                    quantity: "population",
                    value,
                });
            }
        }

        let (_, aux) = derivative(time, &self.state, self.config);
        if !aux.resource.is_finite() {
            return Err(SimError::NonFiniteResource {
                step: index,
                time,
                value: aux.resource,
            });
        }
        for (species, &value) in aux.growth_rates.iter().enumerate() {
            if !value.is_finite() {
                return Err(SimError::NonFinite {
                    step: index,
                    time,
                    species,
                    quantity: "growth rate",
                    value,
                });
            }
        }

        Ok(SimulationSnapshot {
            time,
            populations: self.state.clone(),
            resource: aux.resource,
            growth_rates: aux.growth_rates,
        })
    }
}

impl Iterator for Simulation<'_> {
    type Item = Result<SimulationSnapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.phase == Phase::Completed {
            return None;
        }
        self.phase = Phase::Stepping;

        let result = self.advance();
        self.next_index += 1;

        match &result {
            Err(e) => {
                log::error!("Simulation aborted: {}", e);
                self.phase = Phase::Completed;
            }
            Ok(_) if self.next_index >= self.len => {
                log::debug!("Simulation completed after {} snapshots", self.len);
                self.phase = Phase::Completed;
            }
            Ok(_) => {}
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // An error can end the run early
        (0, Some(self.remaining()))
    }
}

impl FusedIterator for Simulation<'_> {}

/// Run the whole grid in one synchronous call.
pub fn run(config: &ModelConfig, initial: &[f64], grid: &TimeGrid) -> Result<Trajectory> {
    Simulation::new(config, initial, grid)?.collect_trajectory()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivative::resource_level;
    use crate::error::ConfigError;
    use crate::params::SpeciesParameter;

    fn small_config() -> ModelConfig {
        ModelConfig::new(
            7.0,
            vec![
                SpeciesParameter::new(1.0, 0.5, 0.01),
                SpeciesParameter::new(3.0, 1.5, 0.01),
            ],
        )
    }

    #[test]
    fn test_phases() {
        let config = small_config();
        let grid = TimeGrid::new(0.0, 0.2, 0.1).unwrap();
        let mut sim = Simulation::new(&config, &[1.0, 1.0], &grid).unwrap();
        assert_eq!(sim.phase(), Phase::NotStarted);
        assert_eq!(sim.remaining(), 3);

        let first = sim.next().unwrap().unwrap();
        assert_eq!(first.time, 0.0);
        assert_eq!(first.populations, vec![1.0, 1.0]);
        assert_eq!(sim.phase(), Phase::Stepping);

        sim.next().unwrap().unwrap();
        sim.next().unwrap().unwrap();
        assert_eq!(sim.phase(), Phase::Completed);
        assert_eq!(sim.remaining(), 0);
        assert!(sim.next().is_none());
        assert!(sim.next().is_none());
    }

    #[test]
    fn test_single_point_grid_completes_immediately() {
        let config = small_config();
        let grid = TimeGrid::new(2.0, 2.0, 0.1).unwrap();
        let traj = run(&config, &[1.0, 2.0], &grid).unwrap();
        assert_eq!(traj.len(), 1);
        assert_eq!(traj.snapshots()[0].time, 2.0);
    }

    #[test]
    fn test_initial_snapshot_records_rates_and_resource() {
        let config = small_config();
        let grid = TimeGrid::new(0.0, 1.0, 0.5).unwrap();
        let traj = run(&config, &[10.0, 20.0], &grid).unwrap();
        let first = &traj.snapshots()[0];
        // 7 - 0.01 * 30 = 6.7
        assert!((first.resource - 6.7).abs() < 1e-12);
        assert!((first.growth_rates[0] - 0.5 * 5.7).abs() < 1e-12);
        assert!((first.growth_rates[1] - 1.5 * 3.7).abs() < 1e-12);
    }

    #[test]
    fn test_resource_identity_holds_every_snapshot() {
        let config = small_config();
        let grid = TimeGrid::new(0.0, 20.0, 0.05).unwrap();
        let traj = run(&config, &[0.5, 0.5], &grid).unwrap();
        for snap in &traj {
            assert_eq!(snap.resource, resource_level(&config, &snap.populations));
        }
    }

    #[test]
    fn test_rejects_mismatched_lengths_before_stepping() {
        let config = small_config();
        let grid = TimeGrid::new(0.0, 1.0, 0.1).unwrap();
        let err = Simulation::new(&config, &[1.0], &grid).unwrap_err();
        assert!(matches!(
            err,
            SimError::Config(ConfigError::LengthMismatch {
                species: 2,
                populations: 1
            })
        ));
    }

    #[test]
    fn test_rejects_bad_grid() {
        let config = small_config();
        let grid = TimeGrid {
            start: 0.0,
            end: 1.0,
            step: 0.0,
        };
        let err = run(&config, &[1.0, 1.0], &grid).unwrap_err();
        assert!(matches!(err, SimError::Config(ConfigError::NonPositiveStep(_))));
    }

    #[test]
    fn test_runaway_growth_fails_fast() {
        // Negative consumption feeds the resource as the population grows,
        // so growth accelerates until it overflows.
        let config = ModelConfig::new(10.0, vec![SpeciesParameter::new(1.0, 1.0, -1.0)]);
        let grid = TimeGrid::new(0.0, 10.0, 0.1).unwrap();
        let mut sim = Simulation::new(&config, &[1.0], &grid).unwrap();

        let mut emitted = 0;
        let err = loop {
            match sim.next() {
                Some(Ok(_)) => emitted += 1,
                Some(Err(e)) => break e,
                None => panic!("run should not complete"),
            }
        };
        assert!(emitted > 0);
        // The population overflows before the resource it feeds can
        match err {
            SimError::NonFinite {
                step,
                species,
                quantity,
                value,
                ..
            } => {
                assert_eq!(step, emitted);
                assert_eq!(species, 0);
                assert_eq!(quantity, "population");
                assert!(!value.is_finite());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(sim.phase(), Phase::Completed);
        assert!(sim.next().is_none());
    }

    #[test]
    fn test_resource_overflow_reported_with_step() {
        // Each consumption term is finite (1e308) but their sum is not.
        let config = ModelConfig::new(
            7.0,
            vec![
                SpeciesParameter::new(1.0, 0.5, 1e300),
                SpeciesParameter::new(2.0, 0.5, 1e300),
            ],
        );
        let grid = TimeGrid::new(3.0, 4.0, 0.5).unwrap();
        let mut sim = Simulation::new(&config, &[1e8, 1e8], &grid).unwrap();

        match sim.next() {
            Some(Err(SimError::NonFiniteResource { step, time, value })) => {
                assert_eq!(step, 0);
                assert_eq!(time, 3.0);
                assert_eq!(value, f64::NEG_INFINITY);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(sim.phase(), Phase::Completed);
        assert!(sim.next().is_none());
    }

    #[test]
    fn test_rejects_grid_with_repeating_times() {
        let config = small_config();
        let grid = TimeGrid {
            start: 1e17,
            end: 1e17 + 10.0,
            step: 1.0,
        };
        let err = Simulation::new(&config, &[1.0, 1.0], &grid).unwrap_err();
        assert!(matches!(
            err,
            SimError::Config(ConfigError::UnresolvableStep { .. })
        ));
    }

    #[test]
    fn test_rejects_oversized_grid_before_allocating() {
        let config = small_config();
        let grid = TimeGrid {
            start: 0.0,
            end: 1e12,
            step: 1e-3,
        };
        let err = run(&config, &[1.0, 1.0], &grid).unwrap_err();
        assert!(matches!(
            err,
            SimError::Config(ConfigError::TooManySteps { .. })
        ));
    }

    #[test]
    fn test_collect_trajectory_propagates_error() {
        let config = ModelConfig::new(10.0, vec![SpeciesParameter::new(1.0, 1.0, -1.0)]);
        let grid = TimeGrid::new(0.0, 10.0, 0.1).unwrap();
        assert!(run(&config, &[1.0], &grid).is_err());
    }

    #[test]
    fn test_implausible_config_still_runs() {
        // R* above Rmax: the species can only decline, but nothing is rejected.
        let config = ModelConfig::new(2.0, vec![SpeciesParameter::new(5.0, 1.0, 0.001)]);
        let grid = TimeGrid::new(0.0, 5.0, 0.1).unwrap();
        let traj = run(&config, &[100.0], &grid).unwrap();
        let series = traj.population_series(0);
        assert!(series.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_iterator_matches_run() {
        let config = small_config();
        let grid = TimeGrid::new(0.0, 3.0, 0.1).unwrap();
        let streamed: Vec<SimulationSnapshot> = Simulation::new(&config, &[1.0, 2.0], &grid)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let whole = run(&config, &[1.0, 2.0], &grid).unwrap();
        assert_eq!(streamed.as_slice(), whole.snapshots());
    }
}
