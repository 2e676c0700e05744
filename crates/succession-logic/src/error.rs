//! Error types for the succession model.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Everything that can stop a run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A population or growth rate left the finite reals.
    /// `step` is the grid index of the snapshot being produced; `species`
    /// is zero-based.
    #[error("Non-finite {quantity} at step {step} (t = {time}) for species {species}: {value}")]
    NonFinite {
        step: usize,
        time: f64,
        species: usize,
        quantity: &'static str,
        value: f64,
    },

    #[error("Non-finite resource level at step {step} (t = {time}): {value}")]
    NonFiniteResource { step: usize, time: f64, value: f64 },

    /// A scenario file was read but could not be parsed.
    #[error("Scenario {}: {source}", .path.display())]
    Scenario {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration rejected before any step executes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("no species configured")]
    NoSpecies,

    #[error("{species} species parameters but {populations} initial populations")]
    LengthMismatch { species: usize, populations: usize },

    #[error("species {species}: parameter `{field}` is not finite")]
    NonFiniteParameter { species: usize, field: &'static str },

    #[error("maximum resource level is not finite")]
    NonFiniteResourceMax,

    #[error("species {species}: initial population is not finite")]
    NonFiniteInitialPopulation { species: usize },

    #[error("time step must be positive, got {0}")]
    NonPositiveStep(f64),

    #[error("time grid bounds are not finite")]
    NonFiniteGrid,

    #[error("time grid ends ({end}) before it starts ({start})")]
    EndBeforeStart { start: f64, end: f64 },

    /// `(end - start) / step` is infinite or above [`crate::grid::MAX_STEPS`].
    #[error("time grid spans {span} steps, more than the maximum of {max}")]
    TooManySteps { span: f64, max: usize },

    /// Adjacent grid times collapse to the same f64 somewhere on the grid.
    #[error("time step {step} is below f64 resolution near t = {time}")]
    UnresolvableStep { step: f64, time: f64 },
}
