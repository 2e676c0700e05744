//! Right-hand side of the coupled population/resource system.
//!
//! ```text
//! R     = Rmax - sum_i u_i * N_i
//! r_i   = m_i * (R - R*_i)
//! dN_i  = r_i * N_i
//! ```
//!
//! The resource is derived from the populations at every evaluation. It is
//! never a state variable and never integrated.

use crate::growth::species_growth;
use crate::params::{ModelConfig, PopulationState};

/// Values computed alongside the derivative that the integrator does not
/// need but snapshots record.
#[derive(Debug, Clone, PartialEq)]
pub struct Auxiliary {
    pub growth_rates: Vec<f64>,
    pub resource: f64,
}

/// Free resource left after every species' consumption.
///
/// # Panics
///
/// If `populations` does not have one entry per configured species.
pub fn resource_level(config: &ModelConfig, populations: &[f64]) -> f64 {
    assert_eq!(
        config.species.len(),
        populations.len(),
        "one population per species"
    );
    let consumed: f64 = config
        .species
        .iter()
        .zip(populations)
        .map(|(sp, n)| sp.u * n)
        .sum();
    config.global.resource_max - consumed
}

/// Evaluate the system at `state`. `t` is accepted for integrator symmetry;
/// the system is autonomous.
///
/// # Panics
///
/// If `state.len()` differs from the species count. [`crate::Simulation`]
/// checks this before calling in.
pub fn derivative(t: f64, state: &[f64], config: &ModelConfig) -> (PopulationState, Auxiliary) {
    let k = state.len();
    let mut d_state = vec![0.0; k];
    let mut growth_rates = vec![0.0; k];
    let resource = derivative_into(t, state, config, &mut d_state, &mut growth_rates);
    (
        d_state,
        Auxiliary {
            growth_rates,
            resource,
        },
    )
}

/// Allocation-free form of [`derivative`]. Writes `dN` and the per-capita
/// rates into the given buffers and returns the resource level.
///
/// # Panics
///
/// If `state`, `d_state` or `growth_rates` is not one entry per species.
pub fn derivative_into(
    _t: f64,
    state: &[f64],
    config: &ModelConfig,
    d_state: &mut [f64],
    growth_rates: &mut [f64],
) -> f64 {
    assert_eq!(state.len(), d_state.len());
    assert_eq!(state.len(), growth_rates.len());

    let resource = resource_level(config, state);
    for (i, sp) in config.species.iter().enumerate() {
        let r = species_growth(sp, resource);
        growth_rates[i] = r;
        d_state[i] = r * state[i];
    }
    resource
}
