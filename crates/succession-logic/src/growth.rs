//! Per-capita growth rate: linear in the surplus of resource over R*.
//!
//! A species grows when the shared resource sits above its break-even
//! level and shrinks below it:
//!
//! ```text
//! r = m * (R - R*)
//! ```
//!
//! The formula is total over the reals. Negative `R` or `R*` are outside
//! the ecological model but still produce a number.

use crate::params::SpeciesParameter;

/// Per-capita growth rate for sensitivity `m`, resource level `resource`
/// and break-even level `r_star`.
#[inline]
pub fn percapita_growth(m: f64, resource: f64, r_star: f64) -> f64 {
    m * (resource - r_star)
}

/// Growth rate of one species at the given resource level.
#[inline]
pub fn species_growth(species: &SpeciesParameter, resource: f64) -> f64 {
    percapita_growth(species.m, resource, species.r_star)
}

/// Resource level at which the species neither grows nor shrinks.
pub fn break_even_resource(species: &SpeciesParameter) -> f64 {
    species.r_star
}
