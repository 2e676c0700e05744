//! Classical fixed-step RK4 over the population vector.
//!
//! Each stage re-derives the resource from its own intermediate
//! populations through [`derivative_into`]; only populations are advanced.

use crate::derivative::derivative_into;
use crate::params::ModelConfig;

/// Stage buffers reused across steps so a run allocates once.
#[derive(Debug, Clone)]
pub struct Rk4Stepper {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    scratch: Vec<f64>,
    rates: Vec<f64>,
}

impl Rk4Stepper {
    pub fn new(species: usize) -> Self {
        Self {
            k1: vec![0.0; species],
            k2: vec![0.0; species],
            k3: vec![0.0; species],
            k4: vec![0.0; species],
            scratch: vec![0.0; species],
            rates: vec![0.0; species],
        }
    }

    fn resize(&mut self, n: usize) {
        if self.k1.len() != n {
            for buf in [
                &mut self.k1,
                &mut self.k2,
                &mut self.k3,
                &mut self.k4,
                &mut self.scratch,
                &mut self.rates,
            ] {
                buf.resize(n, 0.0);
            }
        }
    }

    /// Advance `state` from `t` to `t + h` in place.
    ///
    /// # Panics
    ///
    /// If `state` does not hold one population per configured species.
    pub fn step(&mut self, config: &ModelConfig, state: &mut [f64], t: f64, h: f64) {
        let n = state.len();
        self.resize(n);
        let half = 0.5 * h;

        derivative_into(t, state, config, &mut self.k1, &mut self.rates);

        for i in 0..n {
            self.scratch[i] = state[i] + half * self.k1[i];
        }
        derivative_into(t + half, &self.scratch, config, &mut self.k2, &mut self.rates);

        for i in 0..n {
            self.scratch[i] = state[i] + half * self.k2[i];
        }
        derivative_into(t + half, &self.scratch, config, &mut self.k3, &mut self.rates);

        for i in 0..n {
            self.scratch[i] = state[i] + h * self.k3[i];
        }
        derivative_into(t + h, &self.scratch, config, &mut self.k4, &mut self.rates);

        for i in 0..n {
            state[i] += (h / 6.0)
                * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }
    }
}

/// One RK4 step with throwaway buffers. Prefer [`Rk4Stepper`] in loops.
/// Panics under the same conditions as [`Rk4Stepper::step`].
pub fn rk4_step(config: &ModelConfig, state: &mut [f64], t: f64, h: f64) {
    Rk4Stepper::new(state.len()).step(config, state, t, h);
}
