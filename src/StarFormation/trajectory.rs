//! # Trajectory
//!
//! Discrete solution of the model: four parallel columns (time, a, m, s) indexed
//! identically. A trajectory is produced once by an integrator and is read-only afterwards;
//! the columns are private and exposed as slices.
//!
//! Besides plain access the module offers the diagnostics used to compare integrators:
//! mass balance residual, first non-finite sample, linear interpolation in time and the
//! maximal deviation from a reference trajectory.
use super::mass_exchange_model::State;
use super::sf_error::StarFormationError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    t: Vec<f64>,
    a: Vec<f64>,
    m: Vec<f64>,
    s: Vec<f64>,
}

impl Trajectory {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            t: Vec::with_capacity(capacity),
            a: Vec::with_capacity(capacity),
            m: Vec::with_capacity(capacity),
            s: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, t: f64, state: State) {
        self.t.push(t);
        self.a.push(state.a);
        self.m.push(state.m);
        self.s.push(state.s);
    }

    /// Builds a trajectory from existing columns.
    ///
    /// # Returns
    /// * `Err(StarFormationError::InvalidInput)` - if the columns differ in length
    pub fn from_columns(
        t: Vec<f64>,
        a: Vec<f64>,
        m: Vec<f64>,
        s: Vec<f64>,
    ) -> Result<Self, StarFormationError> {
        let n = t.len();
        if a.len() != n || m.len() != n || s.len() != n {
            return Err(StarFormationError::InvalidInput(format!(
                "trajectory columns differ in length: t {}, a {}, m {}, s {}",
                n,
                a.len(),
                m.len(),
                s.len()
            )));
        }
        Ok(Self { t, a, m, s })
    }

    pub fn t(&self) -> &[f64] {
        &self.t
    }

    pub fn a(&self) -> &[f64] {
        &self.a
    }

    pub fn m(&self) -> &[f64] {
        &self.m
    }

    pub fn s(&self) -> &[f64] {
        &self.s
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn state_at(&self, index: usize) -> Option<State> {
        if index >= self.len() {
            return None;
        }
        Some(State::new(self.a[index], self.m[index], self.s[index]))
    }

    pub fn initial_state(&self) -> Option<State> {
        self.state_at(0)
    }

    pub fn final_state(&self) -> Option<State> {
        self.len().checked_sub(1).and_then(|i| self.state_at(i))
    }

    pub fn final_time(&self) -> Option<f64> {
        self.t.last().copied()
    }

    /// Finds the first sample holding a NaN or an infinity.
    ///
    /// Integrators never fail on divergence; callers that treat divergence as an error use
    /// this check on the finished trajectory.
    pub fn check_finite(&self) -> Result<(), StarFormationError> {
        for i in 0..self.len() {
            for (name, column) in [("a", &self.a), ("m", &self.m), ("s", &self.s)] {
                if !column[i].is_finite() {
                    return Err(StarFormationError::NumericDivergence {
                        variable: name.to_owned(),
                        index: i,
                        time: self.t[i],
                    });
                }
            }
        }
        Ok(())
    }

    /// a[i] + m[i] + s[i] - 1 for every sample
    pub fn mass_balance_residual(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| self.a[i] + self.m[i] + self.s[i] - 1.0)
            .collect()
    }

    /// max |a + m + s - 1| over the trajectory, NaN if any residual is NaN
    pub fn max_mass_drift(&self) -> f64 {
        self.mass_balance_residual().iter().fold(0.0_f64, |acc, r| {
            if acc.is_nan() || r.is_nan() {
                f64::NAN
            } else {
                acc.max(r.abs())
            }
        })
    }

    /// Linear interpolation of the state at `time`.
    ///
    /// Returns `None` outside `[t_first, t_last]` or for an empty trajectory.
    pub fn value_at(&self, time: f64) -> Option<State> {
        let n = self.len();
        if n == 0 || time < self.t[0] || time > self.t[n - 1] {
            return None;
        }
        // first index with t[idx] >= time
        let idx = self.t.partition_point(|&ti| ti < time);
        if self.t[idx] == time || idx == 0 {
            return self.state_at(idx);
        }
        let (t0, t1) = (self.t[idx - 1], self.t[idx]);
        let w = (time - t0) / (t1 - t0);
        let lerp = |col: &[f64]| col[idx - 1] + w * (col[idx] - col[idx - 1]);
        Some(State::new(lerp(&self.a), lerp(&self.m), lerp(&self.s)))
    }

    /// Largest component deviation between `self` and `reference` at the sample times of
    /// `self` that lie inside the reference time span.
    ///
    /// # Returns
    /// * `Err(StarFormationError::InvalidInput)` - if no sample time is covered by the reference
    pub fn max_deviation_from(&self, reference: &Trajectory) -> Result<f64, StarFormationError> {
        let mut max_dev = 0.0_f64;
        let mut compared = 0usize;
        for i in 0..self.len() {
            if let Some(r) = reference.value_at(self.t[i]) {
                let dev = (self.a[i] - r.a)
                    .abs()
                    .max((self.m[i] - r.m).abs())
                    .max((self.s[i] - r.s).abs());
                max_dev = max_dev.max(dev);
                compared += 1;
            }
        }
        if compared == 0 {
            return Err(StarFormationError::InvalidInput(
                "trajectories share no common time span".to_string(),
            ));
        }
        Ok(max_dev)
    }
}
