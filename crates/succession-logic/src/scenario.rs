//! Scenario records: everything needed to start a run, as loaded from
//! JSON, plus the built-in reference community.
//!
//! ```json
//! {
//!   "name": "reference",
//!   "resource_max": 7.0,
//!   "species": [{ "r_star": 1.0, "m": 0.171, "u": 0.001 }],
//!   "initial_populations": [1e-6],
//!   "time_grid": { "start": 0.0, "end": 100.0, "step": 0.1 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::grid::TimeGrid;
use crate::params::{check_model, ModelConfig, PopulationState, SpeciesParameter};

/// Reference community: five species with R* = 1..5, sensitivity rising
/// geometrically from 0.171 to 1.8, identical consumption, and initial
/// abundances that favour the weakest competitor.
pub mod reference {
    pub const RESOURCE_MAX: f64 = 7.0;
    pub const R_STAR: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];
    pub const M: [f64; 5] = [0.171, 0.308, 0.555, 0.999, 1.8];
    pub const U: f64 = 0.001;
    pub const INITIAL_POPULATIONS: [f64; 5] = [1e-6, 1e-5, 1e-4, 1e-3, 1e-2];
    pub const T_START: f64 = 0.0;
    pub const T_END: f64 = 100.0;
    pub const STEP: f64 = 0.1;
}

/// A complete, serializable run description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub resource_max: f64,
    pub species: Vec<SpeciesParameter>,
    pub initial_populations: PopulationState,
    pub time_grid: TimeGrid,
}

const REFERENCE_JSON: &str = include_str!("../../../data/reference_scenario.json");

impl Scenario {
    /// The reference community.
    ///
    /// Loaded from `data/reference_scenario.json` embedded at compile time.
    pub fn reference() -> Self {
        serde_json::from_str(REFERENCE_JSON).expect("reference_scenario.json is invalid")
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|source| SimError::Scenario {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig::new(self.resource_max, self.species.clone())
    }

    /// Split into validated run inputs.
    pub fn into_parts(self) -> Result<(ModelConfig, PopulationState, TimeGrid)> {
        let config = ModelConfig::new(self.resource_max, self.species);
        check_model(&config, &self.initial_populations)?;
        if let Some(e) = self.time_grid.validate().into_iter().next() {
            return Err(e.into());
        }
        Ok((config, self.initial_populations, self.time_grid))
    }
}
