//! # Limit Period
//!
//! Estimate of the asymptotic oscillation period of the active star fraction s(t).
//! A sample `i` is a steady peak when
//! - it is a strict interior local maximum: `s[i-1] < s[i] > s[i+1]`, `1 <= i <= len - 2`
//! - it lies in the band `|max(s) - s[i]| < tolerance` around the global maximum
//!
//! The limit period is the time between the last two steady peaks. The end points are never
//! candidates: there is no wrap-around comparison of `s[0]` with the last sample.
//! The global maximum ignores NaN samples; a NaN sample itself never qualifies.
use super::sf_error::StarFormationError;
use super::trajectory::Trajectory;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PEAK_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub time: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakDetector {
    pub tolerance: f64,
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_PEAK_TOLERANCE,
        }
    }
}

impl PeakDetector {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    fn check_input(&self, t: &[f64], s: &[f64]) -> Result<(), StarFormationError> {
        if t.len() != s.len() {
            return Err(StarFormationError::InvalidInput(format!(
                "time and value sequences differ in length: {} vs {}",
                t.len(),
                s.len()
            )));
        }
        if s.len() < 3 {
            return Err(StarFormationError::InvalidInput(format!(
                "at least 3 samples required to find peaks, got {}",
                s.len()
            )));
        }
        if !(self.tolerance > 0.0) {
            return Err(StarFormationError::InvalidInput(format!(
                "peak tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// All interior strict local maxima of `s` within the tolerance band of its global maximum,
    /// in time order.
    pub fn steady_peaks(&self, t: &[f64], s: &[f64]) -> Result<Vec<Peak>, StarFormationError> {
        self.check_input(t, s)?;
        let global_max = s
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(f64::NEG_INFINITY, f64::max);
        let peaks = (1..s.len() - 1)
            .filter(|&i| s[i - 1] < s[i] && s[i] > s[i + 1])
            .filter(|&i| (global_max - s[i]).abs() < self.tolerance)
            .map(|i| Peak {
                time: t[i],
                value: s[i],
            })
            .collect();
        Ok(peaks)
    }

    /// Spacing of the last two steady peaks.
    ///
    /// # Returns
    /// * `Err(StarFormationError::InsufficientPeaks)` - fewer than two steady peaks
    /// * `Err(StarFormationError::InvalidInput)` - sequences of different length or shorter than 3
    pub fn limit_period(&self, t: &[f64], s: &[f64]) -> Result<f64, StarFormationError> {
        let peaks = self.steady_peaks(t, s)?;
        match peaks.as_slice() {
            [.., previous, last] => Ok(last.time - previous.time),
            _ => Err(StarFormationError::InsufficientPeaks { found: peaks.len() }),
        }
    }

    /// limit period of the active star fraction of a trajectory
    pub fn trajectory_period(&self, trajectory: &Trajectory) -> Result<f64, StarFormationError> {
        self.limit_period(trajectory.t(), trajectory.s())
    }
}

/// limit period with the default tolerance band 0.05
pub fn limit_period(t: &[f64], s: &[f64]) -> Result<f64, StarFormationError> {
    PeakDetector::default().limit_period(t, s)
}
