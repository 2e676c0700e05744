//! Model parameters: per-species traits, the shared resource ceiling,
//! and validation.
//!
//! Two tiers of checking:
//! - [`validate_model`] collects hard errors (mismatched lengths, non-finite
//!   values). A run with any of these is rejected before the first step.
//! - [`plausibility_warnings`] collects ecologically odd but computable
//!   settings (`m <= 0`, `R* >= Rmax`, ...). These are logged and the run
//!   proceeds exactly as the equations say.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Abundance of each species, in configuration order.
pub type PopulationState = Vec<f64>;

/// Traits of one competing species. Fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesParameter {
    /// Display name (defaults to `species_<n>`, 1-based).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Minimum resource requirement (R*). Growth is zero at this level.
    pub r_star: f64,
    /// Growth-rate sensitivity to resource surplus.
    pub m: f64,
    /// Per-capita resource consumption.
    pub u: f64,
}

impl SpeciesParameter {
    pub fn new(r_star: f64, m: f64, u: f64) -> Self {
        Self {
            name: None,
            r_star,
            m,
            u,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Parameters shared by every species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalParameter {
    /// Resource level with no consumers present (Rmax).
    pub resource_max: f64,
}

/// Full, immutable model configuration handed to the derivative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub global: GlobalParameter,
    pub species: Vec<SpeciesParameter>,
}

impl ModelConfig {
    pub fn new(resource_max: f64, species: Vec<SpeciesParameter>) -> Self {
        Self {
            global: GlobalParameter { resource_max },
            species,
        }
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    /// Name of species `index`, falling back to `species_<index + 1>`.
    pub fn species_name(&self, index: usize) -> String {
        match self.species.get(index).and_then(|s| s.name.as_deref()) {
            Some(name) => name.to_string(),
            None => format!("species_{}", index + 1),
        }
    }

    pub fn species_names(&self) -> Vec<String> {
        (0..self.species.len())
            .map(|i| self.species_name(i))
            .collect()
    }
}

/// Validate a configuration against its initial populations, returning
/// all errors found.
pub fn validate_model(config: &ModelConfig, initial: &[f64]) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.species.is_empty() {
        errors.push(ConfigError::NoSpecies);
    }
    if config.species.len() != initial.len() {
        errors.push(ConfigError::LengthMismatch {
            species: config.species.len(),
            populations: initial.len(),
        });
    }
    if !config.global.resource_max.is_finite() {
        errors.push(ConfigError::NonFiniteResourceMax);
    }

    for (i, sp) in config.species.iter().enumerate() {
        for (field, value) in [("r_star", sp.r_star), ("m", sp.m), ("u", sp.u)] {
            if !value.is_finite() {
                errors.push(ConfigError::NonFiniteParameter { species: i, field });
            }
        }
    }

    for (i, n) in initial.iter().enumerate() {
        if !n.is_finite() {
            errors.push(ConfigError::NonFiniteInitialPopulation { species: i });
        }
    }

    errors
}

/// Like [`validate_model`], but stops at the first error.
pub fn check_model(config: &ModelConfig, initial: &[f64]) -> Result<()> {
    match validate_model(config, initial).into_iter().next() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Settings the equations accept but the ecology does not expect.
#[derive(Debug, Clone, PartialEq)]
pub enum PlausibilityWarning {
    NonPositiveResourceMax(f64),
    NonPositiveRStar { species: usize, r_star: f64 },
    NonPositiveRate { species: usize, m: f64 },
    NonPositiveConsumption { species: usize, u: f64 },
    /// Species can never grow, even with no competitors.
    RStarAboveMax {
        species: usize,
        r_star: f64,
        resource_max: f64,
    },
    NegativeInitialPopulation { species: usize, value: f64 },
}

impl fmt::Display for PlausibilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlausibilityWarning::NonPositiveResourceMax(v) => {
                write!(f, "maximum resource level {} is not positive", v)
            }
            PlausibilityWarning::NonPositiveRStar { species, r_star } => {
                write!(f, "species {}: R* = {} is not positive", species, r_star)
            }
            PlausibilityWarning::NonPositiveRate { species, m } => {
                write!(f, "species {}: growth sensitivity m = {} is not positive", species, m)
            }
            PlausibilityWarning::NonPositiveConsumption { species, u } => {
                write!(f, "species {}: consumption u = {} is not positive", species, u)
            }
            PlausibilityWarning::RStarAboveMax {
                species,
                r_star,
                resource_max,
            } => write!(
                f,
                "species {}: R* = {} is not below Rmax = {}, it cannot persist",
                species, r_star, resource_max
            ),
            PlausibilityWarning::NegativeInitialPopulation { species, value } => {
                write!(f, "species {}: initial population {} is negative", species, value)
            }
        }
    }
}

/// Collect plausibility warnings. Never blocks a run.
pub fn plausibility_warnings(config: &ModelConfig, initial: &[f64]) -> Vec<PlausibilityWarning> {
    let mut warnings = Vec::new();
    let resource_max = config.global.resource_max;

    if resource_max <= 0.0 {
        warnings.push(PlausibilityWarning::NonPositiveResourceMax(resource_max));
    }

    for (i, sp) in config.species.iter().enumerate() {
        if sp.r_star <= 0.0 {
            warnings.push(PlausibilityWarning::NonPositiveRStar {
                species: i,
                r_star: sp.r_star,
            });
        }
        if sp.m <= 0.0 {
            warnings.push(PlausibilityWarning::NonPositiveRate { species: i, m: sp.m });
        }
        if sp.u <= 0.0 {
            warnings.push(PlausibilityWarning::NonPositiveConsumption { species: i, u: sp.u });
        }
        if sp.r_star >= resource_max {
            warnings.push(PlausibilityWarning::RStarAboveMax {
                species: i,
                r_star: sp.r_star,
                resource_max,
            });
        }
    }

    for (i, &n) in initial.iter().enumerate() {
        if n < 0.0 {
            warnings.push(PlausibilityWarning::NegativeInitialPopulation {
                species: i,
                value: n,
            });
        }
    }

    warnings
}
