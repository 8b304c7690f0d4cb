//! # Parameter Sets
//!
//! The single table of named configurations used by every integrator and sweep call site.
//!
//! | Table | Cases | Used for |
//! |-------|-------|----------|
//! | [`phase_portrait_cases`] | six (k1, k2, alpha, a0, m0) cases | time series and phase plane of a(t), m(t) |
//! | [`alpha_sweep_cases`] | alpha = 1.3 ... 1.9, k1 = 8, k2 = 15 | limit period as a function of alpha |
//!
//! Run settings (horizon and step) of the classical study are kept next to the tables as
//! [`RunSettings`] constants.
use super::mass_exchange_model::ParameterSet;
use serde::{Deserialize, Serialize};

/// Horizon and step size of a run. For the adaptive method `dt` only fixes the number of
/// sample points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    pub horizon: f64,
    pub dt: f64,
}

impl RunSettings {
    pub const fn new(horizon: f64, dt: f64) -> Self {
        Self { horizon, dt }
    }
}

/// time series of the six cases with forward Euler
pub const TIME_SERIES_RUN: RunSettings = RunSettings::new(100.0, 0.1);
/// phase plane (a, m) of the six cases
pub const PHASE_PLANE_RUN: RunSettings = RunSettings::new(100.0, 0.01);
/// long forward Euler run for the limit period sweep
pub const EULER_PERIOD_RUN: RunSettings = RunSettings::new(200.0, 0.001);
/// comparison of Euler, RK4 and the adaptive solver on the alpha sweep
pub const METHOD_COMPARISON_RUN: RunSettings = RunSettings::new(100.0, 0.001);

/// A labelled, immutable parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepCase {
    pub label: String,
    pub params: ParameterSet,
}

impl SweepCase {
    pub fn new(label: &str, params: ParameterSet) -> Self {
        Self {
            label: label.to_owned(),
            params,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.params.alpha
    }
}

const PHASE_PORTRAIT: [(&str, ParameterSet); 6] = [
    ("Case 1", ParameterSet::new(10.0, 10.0, 1.0, 0.15, 0.15)),
    ("Case 2", ParameterSet::new(8.0, 15.0, 1.2, 0.40, 0.30)),
    ("Case 3", ParameterSet::new(8.0, 15.0, 1.5, 0.40, 0.30)),
    ("Case 4", ParameterSet::new(8.0, 15.0, 1.9, 0.40, 0.30)),
    ("Case 5", ParameterSet::new(8.0, 15.0, 2.0, 0.40, 0.30)),
    ("Case 6", ParameterSet::new(8.0, 15.0, 2.1, 0.40, 0.30)),
];

// the alpha = 1.3 case starts from m0 = 0.2
const ALPHA_SWEEP: [(&str, ParameterSet); 7] = [
    ("alpha = 1.3", ParameterSet::new(8.0, 15.0, 1.3, 0.4, 0.2)),
    ("alpha = 1.4", ParameterSet::new(8.0, 15.0, 1.4, 0.4, 0.3)),
    ("alpha = 1.5", ParameterSet::new(8.0, 15.0, 1.5, 0.4, 0.3)),
    ("alpha = 1.6", ParameterSet::new(8.0, 15.0, 1.6, 0.4, 0.3)),
    ("alpha = 1.7", ParameterSet::new(8.0, 15.0, 1.7, 0.4, 0.3)),
    ("alpha = 1.8", ParameterSet::new(8.0, 15.0, 1.8, 0.4, 0.3)),
    ("alpha = 1.9", ParameterSet::new(8.0, 15.0, 1.9, 0.4, 0.3)),
];

fn to_cases(table: &[(&str, ParameterSet)]) -> Vec<SweepCase> {
    table
        .iter()
        .map(|(label, params)| SweepCase::new(label, *params))
        .collect()
}

pub fn phase_portrait_cases() -> Vec<SweepCase> {
    to_cases(&PHASE_PORTRAIT)
}

pub fn alpha_sweep_cases() -> Vec<SweepCase> {
    to_cases(&ALPHA_SWEEP)
}

/// Builds an alpha sweep from a base set, one case per exponent, in the given order.
pub fn sweep_over_alpha(base: &ParameterSet, alphas: &[f64]) -> Vec<SweepCase> {
    alphas
        .iter()
        .map(|alpha| SweepCase::new(&format!("alpha = {}", alpha), base.with_alpha(*alpha)))
        .collect()
}

/// looks a case up by label in both tables
pub fn case_by_label(label: &str) -> Option<SweepCase> {
    PHASE_PORTRAIT
        .iter()
        .chain(ALPHA_SWEEP.iter())
        .find(|(l, _)| *l == label)
        .map(|(l, params)| SweepCase::new(l, *params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables() {
        let cases = phase_portrait_cases();
        assert_eq!(cases.len(), 6);
        assert_eq!(cases[0].params, ParameterSet::new(10.0, 10.0, 1.0, 0.15, 0.15));
        assert_eq!(cases[5].alpha(), 2.1);

        let sweep = alpha_sweep_cases();
        let alphas: Vec<f64> = sweep.iter().map(|c| c.alpha()).collect();
        assert_eq!(alphas, vec![1.3, 1.4, 1.5, 1.6, 1.7, 1.8, 1.9]);
        assert_eq!(sweep[0].params.m0, 0.2);
        assert!(sweep[1..].iter().all(|c| c.params.m0 == 0.3));
    }

    #[test]
    fn test_all_cases_are_valid_partitions() {
        for case in phase_portrait_cases().iter().chain(alpha_sweep_cases().iter()) {
            assert!(case.params.validate().is_ok());
            assert!(case.params.s0() >= 0.0, "{} has negative s0", case.label);
        }
    }

    #[test]
    fn test_sweep_over_alpha_keeps_order() {
        let base = ParameterSet::new(8.0, 15.0, 1.0, 0.4, 0.3);
        let cases = sweep_over_alpha(&base, &[1.5, 1.3, 1.4]);
        let alphas: Vec<f64> = cases.iter().map(|c| c.alpha()).collect();
        assert_eq!(alphas, vec![1.5, 1.3, 1.4]);
        assert_eq!(cases[1].label, "alpha = 1.3");
    }

    #[test]
    fn test_case_by_label() {
        assert_eq!(case_by_label("Case 4").unwrap().alpha(), 1.9);
        assert_eq!(case_by_label("alpha = 1.3").unwrap().params.m0, 0.2);
        assert!(case_by_label("Case 7").is_none());
    }
}
