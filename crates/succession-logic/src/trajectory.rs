//! Simulation output: one snapshot per grid point, and the tabular view
//! downstream plotting and reporting consume.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::params::PopulationState;

/// State of the community at one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub time: f64,
    pub populations: PopulationState,
    /// Free resource, `Rmax - sum(u_i * N_i)`.
    pub resource: f64,
    /// Per-capita growth rate of each species at this resource level.
    pub growth_rates: Vec<f64>,
}

impl SimulationSnapshot {
    pub fn total_population(&self) -> f64 {
        self.populations.iter().sum()
    }

    /// Relative abundance of each species. All zeros when nothing is alive.
    pub fn shares(&self) -> Vec<f64> {
        let total = self.total_population();
        if total == 0.0 {
            return vec![0.0; self.populations.len()];
        }
        self.populations.iter().map(|n| n / total).collect()
    }

    /// Index of the most abundant species (lowest index on ties).
    pub fn dominant_species(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &n) in self.populations.iter().enumerate() {
            match best {
                Some((_, b)) if n <= b => {}
                _ => best = Some((i, n)),
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Append-only, time-ordered run output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trajectory {
    pub species: Vec<String>,
    snapshots: Vec<SimulationSnapshot>,
}

impl Trajectory {
    pub fn new(species: Vec<String>) -> Self {
        Self::with_capacity(species, 0)
    }

    pub fn with_capacity(species: Vec<String>, capacity: usize) -> Self {
        Self {
            species,
            snapshots: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, snapshot: SimulationSnapshot) {
        debug_assert!(self
            .snapshots
            .last()
            .map_or(true, |last| snapshot.time > last.time));
        self.snapshots.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[SimulationSnapshot] {
        &self.snapshots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SimulationSnapshot> {
        self.snapshots.iter()
    }

    pub fn final_snapshot(&self) -> Option<&SimulationSnapshot> {
        self.snapshots.last()
    }

    pub fn times(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.time).collect()
    }

    pub fn resource_series(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.resource).collect()
    }

    /// Abundance of one species over time.
    pub fn population_series(&self, species: usize) -> Vec<f64> {
        self.snapshots
            .iter()
            .map(|s| s.populations.get(species).copied().unwrap_or(f64::NAN))
            .collect()
    }

    /// Time at which each species reaches its maximum abundance.
    /// Earliest time wins on ties.
    pub fn peak_times(&self) -> Vec<f64> {
        let k = self.species.len();
        let mut peaks = vec![(f64::NAN, f64::NEG_INFINITY); k];
        for snap in &self.snapshots {
            for (peak, &n) in peaks.iter_mut().zip(&snap.populations) {
                if n > peak.1 {
                    *peak = (snap.time, n);
                }
            }
        }
        peaks.into_iter().map(|(t, _)| t).collect()
    }

    /// Column-oriented view: `time, N_<sp>.., r_<sp>.., R`.
    pub fn table(&self) -> TrajectoryTable {
        let mut columns = Vec::with_capacity(2 + 2 * self.species.len());
        columns.push("time".to_string());
        columns.extend(self.species.iter().map(|s| format!("N_{}", s)));
        columns.extend(self.species.iter().map(|s| format!("r_{}", s)));
        columns.push("R".to_string());

        let rows = self
            .snapshots
            .iter()
            .map(|snap| {
                let mut row = Vec::with_capacity(columns.len());
                row.push(snap.time);
                row.extend_from_slice(&snap.populations);
                row.extend_from_slice(&snap.growth_rates);
                row.push(snap.resource);
                row
            })
            .collect();

        TrajectoryTable { columns, rows }
    }

    /// The table as CSV text with a header line.
    pub fn to_csv(&self) -> String {
        self.table().to_csv()
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a SimulationSnapshot;
    type IntoIter = std::slice::Iter<'a, SimulationSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}

/// Flat table for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl TrajectoryTable {
    pub fn to_csv(&self) -> String {
        let mut out = self.columns.join(",");
        out.push('\n');
        for row in &self.rows {
            for (i, v) in row.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Writing to a String cannot fail
                let _ = write!(out, "{}", v);
            }
            out.push('\n');
        }
        out
    }
}
