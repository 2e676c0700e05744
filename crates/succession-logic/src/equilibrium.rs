//! Resource-ratio predictions from parameters alone.
//!
//! With one limiting resource, the species that can persist at the lowest
//! resource level (lowest R*) draws the resource down below everyone
//! else's break-even point and excludes them. These helpers give the
//! outcome a run should converge to, without integrating anything.

use crate::params::{GlobalParameter, ModelConfig, SpeciesParameter};

/// Abundance at which a species growing alone holds the resource at its
/// R*: `N* = (Rmax - R*) / u`.
///
/// `None` when the species cannot persist alone (`R* >= Rmax`) or does
/// not consume (`u <= 0`, no finite equilibrium).
pub fn monoculture_equilibrium(global: &GlobalParameter, species: &SpeciesParameter) -> Option<f64> {
    if species.r_star >= global.resource_max || species.u <= 0.0 {
        return None;
    }
    Some((global.resource_max - species.r_star) / species.u)
}

/// Species indices ordered from strongest to weakest competitor
/// (ascending R*; ties keep configuration order).
pub fn competitive_ranking(config: &ModelConfig) -> Vec<usize> {
    let mut order: Vec<usize> = (0..config.species.len()).collect();
    order.sort_by(|&a, &b| config.species[a].r_star.total_cmp(&config.species[b].r_star));
    order
}

/// Species expected to exclude all others: lowest R* among those that can
/// persist on their own.
pub fn predicted_winner(config: &ModelConfig) -> Option<usize> {
    competitive_ranking(config)
        .into_iter()
        .find(|&i| monoculture_equilibrium(&config.global, &config.species[i]).is_some())
}

/// Resource level the community should settle at: the winner's R*,
/// or Rmax when no species can persist.
pub fn predicted_resource(config: &ModelConfig) -> f64 {
    match predicted_winner(config) {
        Some(i) => config.species[i].r_star,
        None => config.global.resource_max,
    }
}
