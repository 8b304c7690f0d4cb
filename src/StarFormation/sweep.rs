//! # Sweep Driver
//!
//! Runs every integration method over an ordered list of parameter sets with one horizon and
//! step, and extracts the limit period of each trajectory. The result keeps one aligned
//! sequence of estimates per method, in exactly the order of the input cases.
//!
//! - [`run_sweep`]: sequential, stops at the first failure
//! - [`run_sweep_parallel`]: the same computation with the (method, case) runs distributed
//!   over the rayon thread pool; values and ordering are identical to [`run_sweep`]
//! - [`run_sweep_lenient`]: sequential, a failed run or period estimate is logged and
//!   stored as `None`
use super::integrator::{IntegrationMethod, Integrator};
use super::limit_period::PeakDetector;
use super::parameter_sets::{RunSettings, SweepCase};
use super::sf_error::StarFormationError;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub label: String,
    pub alpha: f64,
    pub period: Option<f64>,
}

/// Period estimates of one method, aligned with the sweep cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSweep {
    pub method: String,
    pub points: Vec<SweepPoint>,
}

impl MethodSweep {
    pub fn periods(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.period).collect()
    }

    /// (alpha, period) pairs of the successful estimates
    pub fn alpha_period_pairs(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .filter_map(|p| p.period.map(|period| (p.alpha, period)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    pub horizon: f64,
    pub dt: f64,
    pub methods: Vec<MethodSweep>,
}

impl SweepResult {
    /// exponents of the sweep cases, in sweep order
    pub fn alphas(&self) -> Vec<f64> {
        self.methods
            .first()
            .map(|m| m.points.iter().map(|p| p.alpha).collect())
            .unwrap_or_default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.methods
            .first()
            .map(|m| m.points.iter().map(|p| p.label.clone()).collect())
            .unwrap_or_default()
    }

    pub fn method(&self, name: &str) -> Option<&MethodSweep> {
        self.methods.iter().find(|m| m.method == name)
    }
}

fn period_of(
    method: &IntegrationMethod,
    settings: &RunSettings,
    case: &SweepCase,
    detector: &PeakDetector,
) -> Result<f64, StarFormationError> {
    let trajectory = method.integrate(settings.horizon, settings.dt, &case.params)?;
    detector.trajectory_period(&trajectory)
}

fn check_sweep(methods: &[IntegrationMethod], cases: &[SweepCase]) -> Result<(), StarFormationError> {
    if methods.is_empty() {
        return Err(StarFormationError::InvalidInput(
            "sweep needs at least one integration method".to_string(),
        ));
    }
    if cases.is_empty() {
        return Err(StarFormationError::InvalidInput(
            "sweep needs at least one parameter set".to_string(),
        ));
    }
    Ok(())
}

fn assemble(
    settings: &RunSettings,
    methods: &[IntegrationMethod],
    cases: &[SweepCase],
    periods: Vec<Vec<Option<f64>>>,
) -> SweepResult {
    let methods = methods
        .iter()
        .zip(periods)
        .map(|(method, method_periods)| MethodSweep {
            method: method.name(),
            points: cases
                .iter()
                .zip(method_periods)
                .map(|(case, period)| SweepPoint {
                    label: case.label.clone(),
                    alpha: case.alpha(),
                    period,
                })
                .collect(),
        })
        .collect();
    SweepResult {
        horizon: settings.horizon,
        dt: settings.dt,
        methods,
    }
}

/// Sequential sweep; the first failing run or period estimate aborts the sweep.
pub fn run_sweep(
    settings: &RunSettings,
    methods: &[IntegrationMethod],
    cases: &[SweepCase],
) -> Result<SweepResult, StarFormationError> {
    check_sweep(methods, cases)?;
    let detector = PeakDetector::default();
    let mut periods = Vec::with_capacity(methods.len());
    for method in methods {
        let mut method_periods = Vec::with_capacity(cases.len());
        for case in cases {
            let period = period_of(method, settings, case, &detector)?;
            info!("{} | {}: period = {:.4}", method.name(), case.label, period);
            method_periods.push(Some(period));
        }
        periods.push(method_periods);
    }
    Ok(assemble(settings, methods, cases, periods))
}

/// Parallel sweep over all (method, case) pairs; fails with the error of the first
/// failing pair in sweep order.
pub fn run_sweep_parallel(
    settings: &RunSettings,
    methods: &[IntegrationMethod],
    cases: &[SweepCase],
) -> Result<SweepResult, StarFormationError> {
    check_sweep(methods, cases)?;
    let detector = PeakDetector::default();
    let jobs: Vec<(usize, usize)> = (0..methods.len())
        .flat_map(|mi| (0..cases.len()).map(move |ci| (mi, ci)))
        .collect();
    info!(
        "parallel sweep: {} methods x {} cases on {} threads",
        methods.len(),
        cases.len(),
        rayon::current_num_threads()
    );
    let results: Vec<Result<f64, StarFormationError>> = jobs
        .par_iter()
        .map(|&(mi, ci)| period_of(&methods[mi], settings, &cases[ci], &detector))
        .collect();
    let mut periods = vec![Vec::with_capacity(cases.len()); methods.len()];
    for (&(mi, _), result) in jobs.iter().zip(results) {
        periods[mi].push(Some(result?));
    }
    Ok(assemble(settings, methods, cases, periods))
}

/// Sequential sweep that records failures as missing estimates.
pub fn run_sweep_lenient(
    settings: &RunSettings,
    methods: &[IntegrationMethod],
    cases: &[SweepCase],
) -> Result<SweepResult, StarFormationError> {
    check_sweep(methods, cases)?;
    let detector = PeakDetector::default();
    let periods = methods
        .iter()
        .map(|method| {
            cases
                .iter()
                .map(|case| match period_of(method, settings, case, &detector) {
                    Ok(period) => {
                        info!("{} | {}: period = {:.4}", method.name(), case.label, period);
                        Some(period)
                    }
                    Err(e) => {
                        warn!("{} | {}: no period estimate: {}", method.name(), case.label, e);
                        None
                    }
                })
                .collect()
        })
        .collect();
    Ok(assemble(settings, methods, cases, periods))
}
