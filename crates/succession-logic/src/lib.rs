//! Pure simulation logic for resource-ratio succession.
//!
//! Several species compete for a single depletable resource. Each species
//! grows when the shared resource sits above its break-even level (R*) and
//! shrinks below it, so over time the species that tolerates the lowest
//! resource level takes over. This crate holds the model and its fixed-step
//! RK4 integration. Functions take plain data and return results; there is
//! no I/O beyond reading a scenario file, so everything is unit-testable
//! and the headless harness (`succession-simtest`) stays thin.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`derivative`] | Coupled population/resource right-hand side |
//! | [`equilibrium`] | R* ranking, monoculture equilibria, predicted winner |
//! | [`error`] | `SimError` and `ConfigError` |
//! | [`grid`] | Uniform time grid |
//! | [`growth`] | Per-capita growth rate `m * (R - R*)` |
//! | [`integrator`] | Classical fixed-step RK4 |
//! | [`params`] | Species/global parameters, validation, plausibility warnings |
//! | [`scenario`] | JSON scenario records and the bundled reference scenario |
//! | [`simulator`] | Driver loop: snapshot iterator and one-shot `run` |
//! | [`trajectory`] | Snapshots, trajectory table, CSV export |
//!
//! ```
//! use succession_logic::scenario::Scenario;
//! use succession_logic::simulator;
//!
//! let (config, initial, grid) = Scenario::reference().into_parts().unwrap();
//! let trajectory = simulator::run(&config, &initial, &grid).unwrap();
//! assert_eq!(trajectory.len(), 1001);
//! ```

pub mod derivative;
pub mod equilibrium;
pub mod error;
pub mod grid;
pub mod growth;
pub mod integrator;
pub mod params;
pub mod scenario;
pub mod simulator;
pub mod trajectory;

pub use error::{ConfigError, Result, SimError};
pub use grid::TimeGrid;
pub use params::{GlobalParameter, ModelConfig, PopulationState, SpeciesParameter};
pub use simulator::{run, Simulation};
pub use trajectory::{SimulationSnapshot, Trajectory};
