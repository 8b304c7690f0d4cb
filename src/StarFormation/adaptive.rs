//! # Adaptive Step Integration
//!
//! ## Purpose
//! Error-controlled integration of the star formation model with an embedded explicit
//! Runge-Kutta 4(5) pair. The solver itself is an injected capability: anything that
//! implements [`AdaptiveSolver`] can be plugged into [`AdaptiveIntegrator`] or into
//! [`integrate_adaptive`].
//!
//! ## Backends
//! - [`DormandPrince45`]: native Dormand-Prince 5(4) pair with error control on the
//!   4th order estimate, step size controller with safety factor and quartic dense output.
//!   Sample points are served from the interpolant of the step that covers them, so the
//!   step sequence does not depend on the requested sampling.
//! - [`SymbolicRK45`]: delegates to the RustedSciThe `UniversalODESolver` with the
//!   `NonStiff("RK45")` solver type on the symbolic form of the system; the raw solution is
//!   linearly interpolated onto the sample points.
//!
//! ## Sampling
//! [`AdaptiveIntegrator`] asks for `N = floor(T/dt)` equally spaced points of `[0, T]`
//! (first point 0, last point exactly T); `dt` does not influence the internal steps.
//! Sample points lying beyond the end of the span by no more than a rounding tolerance
//! are accepted and evaluated from the last step.
//!
//! ## Defaults
//! rtol = 1e-3, atol = 1e-6, no limit on the step size.
use super::integrator::{Integrator, step_count};
use super::mass_exchange_model::{ARGUMENT, MassExchangeModel, ParameterSet, State, UNKNOWNS};
use super::sf_error::StarFormationError;
use super::trajectory::Trajectory;
use RustedSciThe::numerical::ODE_api2::{SolverParam, SolverType, UniversalODESolver};
use enum_dispatch::enum_dispatch;
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;

pub const DEFAULT_RTOL: f64 = 1e-3;
pub const DEFAULT_ATOL: f64 = 1e-6;

/// Capability of integrating the model over a span and reporting the state at given times.
#[enum_dispatch]
pub trait AdaptiveSolver {
    /// Integrates `model` from `span.0` to `span.1` starting at `y0` and returns the state at
    /// every entry of `sample_points` (sorted, inside the span).
    fn solve_sampled(
        &self,
        model: &MassExchangeModel,
        span: (f64, f64),
        y0: [f64; 3],
        sample_points: &[f64],
    ) -> Result<Trajectory, StarFormationError>;
    fn name(&self) -> String;
}

/// `n` equally spaced points from `start` to `end`, both ends included
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut points: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            points[n - 1] = end;
            points
        }
    }
}

fn span_tolerance(span: (f64, f64)) -> f64 {
    1e-9 * span.0.abs().max(span.1.abs()).max(1.0)
}

/// checks the span and the sample points shared by every backend
fn check_request(span: (f64, f64), y0: &[f64; 3], sample_points: &[f64]) -> Result<(), StarFormationError> {
    let (t0, t1) = span;
    if !t0.is_finite() || !t1.is_finite() || t1 <= t0 {
        return Err(StarFormationError::InvalidInput(format!(
            "invalid integration span ({}, {})",
            t0, t1
        )));
    }
    if y0.iter().any(|v| !v.is_finite()) {
        return Err(StarFormationError::InvalidInput(format!(
            "initial state is not finite: {:?}",
            y0
        )));
    }
    let tol = span_tolerance(span);
    if sample_points.windows(2).any(|w| !(w[0] <= w[1])) {
        return Err(StarFormationError::InvalidInput(
            "sample points must be sorted in increasing order".to_string(),
        ));
    }
    if let (Some(first), Some(last)) = (sample_points.first(), sample_points.last()) {
        if *first < t0 - tol || *last > t1 + tol {
            return Err(StarFormationError::InvalidInput(format!(
                "sample points [{}, {}] exceed integration span ({}, {})",
                first, last, t0, t1
            )));
        }
    }
    Ok(())
}

fn rms_norm(v: &[f64; 3]) -> f64 {
    (v.iter().map(|x| x * x).sum::<f64>() / 3.0).sqrt()
}

////////////////////////////////////////////////////////////////////////////////////////
//                               DORMAND-PRINCE 5(4)
////////////////////////////////////////////////////////////////////////////////////////

const C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];
const A: [[f64; 5]; 6] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
    ],
];
const B: [f64; 6] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];
// difference between the 5th and the embedded 4th order weights, last entry for the FSAL stage
const E: [f64; 7] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];
// coefficients of the quartic dense output, one row per stage
const P: [[f64; 4]; 7] = [
    [
        1.0,
        -8048581381.0 / 2820520608.0,
        8663915743.0 / 2820520608.0,
        -12715105075.0 / 11282082432.0,
    ],
    [0.0, 0.0, 0.0, 0.0],
    [
        0.0,
        131558114200.0 / 32700410799.0,
        -68118460800.0 / 10900136933.0,
        87487479700.0 / 32700410799.0,
    ],
    [
        0.0,
        -1754552775.0 / 470086768.0,
        14199869525.0 / 1410260304.0,
        -10690763975.0 / 1880347072.0,
    ],
    [
        0.0,
        127303824393.0 / 49829197408.0,
        -318862633887.0 / 49829197408.0,
        701980252875.0 / 199316789632.0,
    ],
    [
        0.0,
        -282668133.0 / 205662961.0,
        2019193451.0 / 616988883.0,
        -1453857185.0 / 822651844.0,
    ],
    [
        0.0,
        40617522.0 / 29380423.0,
        -110615467.0 / 29380423.0,
        69997945.0 / 29380423.0,
    ],
];

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
// -1/(q+1) with q = 4, the order of the error estimator
const ERROR_EXPONENT: f64 = -1.0 / 5.0;

/// Native Dormand-Prince 5(4) solver.
#[derive(Debug, Clone, PartialEq)]
pub struct DormandPrince45 {
    pub rtol: f64,
    pub atol: f64,
    pub max_step: f64,
    /// upper bound on attempted (accepted + rejected) steps
    pub max_steps: usize,
}

impl Default for DormandPrince45 {
    fn default() -> Self {
        Self {
            rtol: DEFAULT_RTOL,
            atol: DEFAULT_ATOL,
            max_step: f64::INFINITY,
            max_steps: 1_000_000,
        }
    }
}

/// one accepted step with everything needed for dense output on [t_old, t_old + h]
struct StepInterpolant {
    t_old: f64,
    h: f64,
    y_old: [f64; 3],
    q: [[f64; 4]; 3],
}

impl StepInterpolant {
    fn new(t_old: f64, h: f64, y_old: [f64; 3], k: &[[f64; 3]; 7]) -> Self {
        let mut q = [[0.0; 4]; 3];
        for i in 0..3 {
            for j in 0..4 {
                q[i][j] = (0..7).map(|stage| k[stage][i] * P[stage][j]).sum();
            }
        }
        Self { t_old, h, y_old, q }
    }

    fn eval(&self, t: f64) -> [f64; 3] {
        let x = (t - self.t_old) / self.h;
        let mut y = self.y_old;
        for i in 0..3 {
            let mut power = x;
            let mut acc = 0.0;
            for j in 0..4 {
                acc += self.q[i][j] * power;
                power *= x;
            }
            y[i] += self.h * acc;
        }
        y
    }
}

impl DormandPrince45 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerances(rtol: f64, atol: f64) -> Self {
        Self {
            rtol,
            atol,
            ..Self::default()
        }
    }

    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = max_step;
        self
    }

    fn check_settings(&self) -> Result<(), StarFormationError> {
        if !(self.rtol > 0.0) || !(self.atol > 0.0) {
            return Err(StarFormationError::InvalidInput(format!(
                "tolerances must be positive, got rtol = {}, atol = {}",
                self.rtol, self.atol
            )));
        }
        if !(self.max_step > 0.0) {
            return Err(StarFormationError::InvalidInput(format!(
                "max_step must be positive, got {}",
                self.max_step
            )));
        }
        if self.rtol < 100.0 * f64::EPSILON {
            warn!("rtol = {} is below 100*eps, results may be dominated by rounding", self.rtol);
        }
        Ok(())
    }

    /// Initial step estimate (Hairer, Norsett, Wanner, Solving ODE I, section II.4).
    fn initial_step(&self, model: &MassExchangeModel, t0: f64, y0: &[f64; 3], f0: &[f64; 3]) -> f64 {
        let scale: Vec<f64> = y0.iter().map(|y| self.atol + y.abs() * self.rtol).collect();
        let scaled = |v: &[f64; 3]| [v[0] / scale[0], v[1] / scale[1], v[2] / scale[2]];
        let d0 = rms_norm(&scaled(y0));
        let d1 = rms_norm(&scaled(f0));
        let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
        let y1 = [y0[0] + h0 * f0[0], y0[1] + h0 * f0[1], y0[2] + h0 * f0[2]];
        let f1 = model.rhs(t0 + h0, &y1);
        let d2 = rms_norm(&scaled(&[f1[0] - f0[0], f1[1] - f0[1], f1[2] - f0[2]])) / h0;
        let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(1.0 / 5.0)
        };
        (100.0 * h0).min(h1)
    }

    /// Stages of one Dormand-Prince step. Returns the 5th order solution and all seven
    /// stage derivatives, the last one being f(t + h, y_new).
    fn rk_step(
        model: &MassExchangeModel,
        t: f64,
        y: &[f64; 3],
        f: &[f64; 3],
        h: f64,
    ) -> ([f64; 3], [[f64; 3]; 7]) {
        let mut k = [[0.0; 3]; 7];
        k[0] = *f;
        for s in 1..6 {
            let mut ys = *y;
            for i in 0..3 {
                let dy: f64 = (0..s).map(|j| A[s][j] * k[j][i]).sum();
                ys[i] += h * dy;
            }
            k[s] = model.rhs(t + C[s] * h, &ys);
        }
        let mut y_new = *y;
        for i in 0..3 {
            let dy: f64 = (0..6).map(|j| B[j] * k[j][i]).sum();
            y_new[i] += h * dy;
        }
        k[6] = model.rhs(t + h, &y_new);
        (y_new, k)
    }

    fn error_norm(&self, k: &[[f64; 3]; 7], h: f64, y: &[f64; 3], y_new: &[f64; 3]) -> f64 {
        let mut err = [0.0; 3];
        for i in 0..3 {
            let e: f64 = (0..7).map(|j| E[j] * k[j][i]).sum();
            let scale = self.atol + y[i].abs().max(y_new[i].abs()) * self.rtol;
            err[i] = e * h / scale;
        }
        rms_norm(&err)
    }
}

impl AdaptiveSolver for DormandPrince45 {
    fn solve_sampled(
        &self,
        model: &MassExchangeModel,
        span: (f64, f64),
        y0: [f64; 3],
        sample_points: &[f64],
    ) -> Result<Trajectory, StarFormationError> {
        self.check_settings()?;
        check_request(span, &y0, sample_points)?;
        let (t0, t_bound) = span;
        let tol = span_tolerance(span);
        let mut trajectory = Trajectory::with_capacity(sample_points.len());
        let mut next_sample = 0usize;
        while next_sample < sample_points.len() && sample_points[next_sample] <= t0 {
            trajectory.push(sample_points[next_sample], State::from_array(y0));
            next_sample += 1;
        }

        let mut t = t0;
        let mut y = y0;
        let mut f = model.rhs(t, &y);
        let mut h_abs = self
            .initial_step(model, t0, &y0, &f)
            .min(self.max_step)
            .min(t_bound - t0);
        let mut attempts = 0usize;
        let mut accepted = 0usize;

        while t < t_bound {
            let min_step = 10.0 * f64::EPSILON * t.abs().max(1.0);
            if h_abs > self.max_step {
                h_abs = self.max_step;
            } else if h_abs < min_step {
                h_abs = min_step;
            }
            let mut step_rejected = false;
            let (t_new, y_new, k, h) = loop {
                attempts += 1;
                if attempts > self.max_steps {
                    return Err(StarFormationError::SolverFailure(format!(
                        "maximal number of steps {} reached at t = {}",
                        self.max_steps, t
                    )));
                }
                if h_abs < min_step {
                    return Err(StarFormationError::SolverFailure(format!(
                        "required step size is less than spacing between numbers at t = {}",
                        t
                    )));
                }
                let mut t_new = t + h_abs;
                if t_new > t_bound {
                    t_new = t_bound;
                }
                let h = t_new - t;
                let (y_new, k) = Self::rk_step(model, t, &y, &f, h);
                let err_norm = self.error_norm(&k, h, &y, &y_new);
                // a NaN error norm (e.g. negative m under a fractional power) is a rejection
                if err_norm < 1.0 {
                    let mut factor = if err_norm == 0.0 {
                        MAX_FACTOR
                    } else {
                        MAX_FACTOR.min(SAFETY * err_norm.powf(ERROR_EXPONENT))
                    };
                    if step_rejected {
                        factor = factor.min(1.0);
                    }
                    h_abs = h * factor;
                    break (t_new, y_new, k, h);
                }
                h_abs = h * MIN_FACTOR.max(SAFETY * err_norm.powf(ERROR_EXPONENT));
                step_rejected = true;
            };
            accepted += 1;

            let interpolant = StepInterpolant::new(t, h, y, &k);
            let last_step = t_new >= t_bound;
            while next_sample < sample_points.len() {
                let tp = sample_points[next_sample];
                let covered = tp <= t_new || (last_step && tp <= t_bound + tol);
                if !covered {
                    break;
                }
                let yp = if tp == t_new { y_new } else { interpolant.eval(tp) };
                trajectory.push(tp, State::from_array(yp));
                next_sample += 1;
            }
            t = t_new;
            y = y_new;
            f = k[6];
        }
        debug!(
            "Dormand-Prince 4(5): {} accepted steps, {} rejected, {} samples",
            accepted,
            attempts - accepted,
            trajectory.len()
        );
        Ok(trajectory)
    }

    fn name(&self) -> String {
        "RK45".to_string()
    }
}

////////////////////////////////////////////////////////////////////////////////////////
//                               RUSTEDSCITHE BACKEND
////////////////////////////////////////////////////////////////////////////////////////

/// RK45 of the RustedSciThe `UniversalODESolver` applied to the symbolic system.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolicRK45 {
    pub rtol: f64,
    pub atol: f64,
    pub max_step: f64,
}

impl Default for SymbolicRK45 {
    fn default() -> Self {
        Self {
            rtol: DEFAULT_RTOL,
            atol: DEFAULT_ATOL,
            max_step: 1.0,
        }
    }
}

impl SymbolicRK45 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn solver_params(&self) -> HashMap<String, SolverParam> {
        HashMap::from([
            ("step_size".to_owned(), SolverParam::Float(1e-3)),
            ("tolerance".to_owned(), SolverParam::Float(self.rtol)),
            ("max_iterations".to_owned(), SolverParam::Int(100000)),
            ("rtol".to_owned(), SolverParam::Float(self.rtol)),
            ("atol".to_owned(), SolverParam::Float(self.atol)),
            ("max_step".to_owned(), SolverParam::Float(self.max_step)),
            ("first_step".to_owned(), SolverParam::OptionalFloat(None)),
            ("vectorized".to_owned(), SolverParam::Bool(false)),
            ("jac_sparsity".to_owned(), SolverParam::OptionalMatrix(None)),
            ("parallel".to_owned(), SolverParam::Bool(false)),
        ])
    }
}

/// Raw solver output as a trajectory; the solution matrix may come as (time x variable)
/// or as (variable x time).
fn trajectory_from_solution(t: &DVector<f64>, y: &DMatrix<f64>) -> Result<Trajectory, StarFormationError> {
    let n = t.len();
    let column = |var: usize| -> Result<Vec<f64>, StarFormationError> {
        if y.nrows() == n && y.ncols() == 3 {
            Ok(y.column(var).iter().copied().collect())
        } else if y.ncols() == n && y.nrows() == 3 {
            Ok(y.row(var).iter().copied().collect())
        } else {
            Err(StarFormationError::SolverFailure(format!(
                "solution matrix {}x{} does not match {} time points",
                y.nrows(),
                y.ncols(),
                n
            )))
        }
    };
    Trajectory::from_columns(t.iter().copied().collect(), column(0)?, column(1)?, column(2)?)
}

impl AdaptiveSolver for SymbolicRK45 {
    fn solve_sampled(
        &self,
        model: &MassExchangeModel,
        span: (f64, f64),
        y0: [f64; 3],
        sample_points: &[f64],
    ) -> Result<Trajectory, StarFormationError> {
        check_request(span, &y0, sample_points)?;
        let mut ode = UniversalODESolver::new(
            model.symbolic_rhs(),
            UNKNOWNS.iter().map(|u| u.to_string()).collect(),
            ARGUMENT.to_owned(),
            SolverType::NonStiff("RK45".to_owned()),
            span.0,
            DVector::from_vec(y0.to_vec()),
            span.1,
        );
        ode.set_parameters(self.solver_params());
        ode.initialize();
        ode.solve();
        let (t_result, y_result) = ode.get_result();
        let (t_raw, y_raw) = match (t_result, y_result) {
            (Some(t), Some(y)) => (t, y),
            _ => {
                return Err(StarFormationError::SolverFailure(
                    "RustedSciThe RK45 returned no solution".to_string(),
                ));
            }
        };
        let raw = trajectory_from_solution(&t_raw, &y_raw)?;
        let t_last = raw.final_time().ok_or_else(|| {
            StarFormationError::SolverFailure("RustedSciThe RK45 returned an empty solution".to_string())
        })?;
        let tol = span_tolerance(span);
        debug!("RustedSciThe RK45: {} raw points", raw.len());

        let mut trajectory = Trajectory::with_capacity(sample_points.len());
        for &tp in sample_points {
            // points past the last raw time by rounding only take the last raw state
            let lookup = if tp > t_last && tp <= span.1 + tol { t_last } else { tp };
            let state = raw.value_at(lookup).ok_or_else(|| {
                StarFormationError::SolverFailure(format!(
                    "solution ends at t = {} before sample point {}",
                    t_last, tp
                ))
            })?;
            trajectory.push(tp, state);
        }
        Ok(trajectory)
    }

    fn name(&self) -> String {
        "RK45 (RustedSciThe)".to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch(AdaptiveSolver)]
pub enum AdaptiveBackend {
    DormandPrince(DormandPrince45),
    Symbolic(SymbolicRK45),
}

impl Default for AdaptiveBackend {
    fn default() -> Self {
        AdaptiveBackend::DormandPrince(DormandPrince45::default())
    }
}

/// Integrates the model of `params` over [0, horizon] with any adaptive solver, sampled at
/// `sample_points`.
pub fn integrate_adaptive<S: AdaptiveSolver>(
    solver: &S,
    horizon: f64,
    params: &ParameterSet,
    sample_points: &[f64],
) -> Result<Trajectory, StarFormationError> {
    params.validate()?;
    let model = MassExchangeModel::new(*params);
    solver.solve_sampled(
        &model,
        (0.0, horizon),
        params.initial_state().to_array(),
        sample_points,
    )
}

/// Adaptive method in the common [`Integrator`] interface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdaptiveIntegrator {
    pub backend: AdaptiveBackend,
}

impl AdaptiveIntegrator {
    pub fn new(backend: AdaptiveBackend) -> Self {
        Self { backend }
    }
}

impl Integrator for AdaptiveIntegrator {
    fn integrate(
        &self,
        horizon: f64,
        dt: f64,
        params: &ParameterSet,
    ) -> Result<Trajectory, StarFormationError> {
        let n = step_count(horizon, dt)?;
        let samples = linspace(0.0, horizon, n);
        info!(
            "adaptive integration with {}: T = {}, {} sample points",
            self.backend.name(),
            horizon,
            n
        );
        integrate_adaptive(&self.backend, horizon, params, &samples)
    }

    fn name(&self) -> String {
        "RK45".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StarFormation::fixed_step::runge_kutta4;
    use approx::assert_relative_eq;

    fn decay_params() -> ParameterSet {
        // m = 0 switches off both exchange terms: s(t) = s0*exp(-t), a = 1 - s
        ParameterSet::new(10.0, 10.0, 1.0, 0.5, 0.0)
    }

    #[test]
    fn test_linspace() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(0.0, 1.0, 1), vec![0.0]);
        let p = linspace(0.0, 10.0, 5);
        assert_eq!(p, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
        let p = linspace(0.0, 100.0, 1000);
        assert_eq!(p.len(), 1000);
        assert_eq!(*p.last().unwrap(), 100.0);
    }

    #[test]
    fn test_exponential_decay_accuracy() {
        let samples = linspace(0.0, 5.0, 51);
        let tight = DormandPrince45::with_tolerances(1e-10, 1e-12);
        let traj = integrate_adaptive(&tight, 5.0, &decay_params(), &samples).unwrap();
        assert_eq!(traj.len(), 51);
        for (i, t) in traj.t().iter().enumerate() {
            assert_relative_eq!(traj.s()[i], 0.5 * (-t).exp(), epsilon = 1e-8);
            assert_relative_eq!(traj.a()[i], 1.0 - 0.5 * (-t).exp(), epsilon = 1e-8);
            assert_eq!(traj.m()[i], 0.0);
        }

        let loose = integrate_adaptive(&DormandPrince45::default(), 5.0, &decay_params(), &samples).unwrap();
        assert!(loose.max_deviation_from(&traj).unwrap() < 1e-3);
    }

    #[test]
    fn test_agrees_with_rk4_on_oscillating_case() {
        let p = ParameterSet::new(8.0, 15.0, 1.5, 0.4, 0.3);
        let reference = runge_kutta4(20.0, 0.001, &p).unwrap();
        let tight = DormandPrince45::with_tolerances(1e-8, 1e-10);
        let samples = linspace(0.0, 20.0, 201);
        let traj = integrate_adaptive(&tight, 20.0, &p, &samples).unwrap();
        assert!(traj.max_deviation_from(&reference).unwrap() < 1e-4);
        assert!(traj.max_mass_drift() < 1e-8);
    }

    #[test]
    fn test_integrator_sampling() {
        let p = ParameterSet::new(10.0, 10.0, 1.0, 0.15, 0.15);
        let traj = AdaptiveIntegrator::default().integrate(10.0, 0.1, &p).unwrap();
        assert_eq!(traj.len(), 100);
        assert_eq!(traj.t()[0], 0.0);
        assert_eq!(traj.final_time(), Some(10.0));
        assert_eq!(traj.initial_state().unwrap(), p.initial_state());
        assert!(traj.check_finite().is_ok());
    }

    #[test]
    fn test_sample_point_slightly_past_span() {
        // cumulative grids such as 0.05 + 0.05 + ... overshoot the end by rounding
        let mut t = 0.0;
        let mut samples = vec![0.0];
        for _ in 0..200 {
            t += 0.05;
            samples.push(t);
        }
        assert!(*samples.last().unwrap() > 10.0);
        let traj = integrate_adaptive(&DormandPrince45::default(), 10.0, &decay_params(), &samples).unwrap();
        assert_eq!(traj.len(), 201);
        assert_relative_eq!(*traj.s().last().unwrap(), 0.5 * (-10.0_f64).exp(), epsilon = 1e-4);
    }

    #[test]
    fn test_rejects_bad_requests() {
        let solver = DormandPrince45::default();
        let p = decay_params();
        let beyond = [0.0, 5.0, 10.1];
        assert!(matches!(
            integrate_adaptive(&solver, 10.0, &p, &beyond),
            Err(StarFormationError::InvalidInput(_))
        ));
        let unsorted = [0.0, 5.0, 2.0];
        assert!(matches!(
            integrate_adaptive(&solver, 10.0, &p, &unsorted),
            Err(StarFormationError::InvalidInput(_))
        ));
        let model = MassExchangeModel::new(p);
        assert!(solver.solve_sampled(&model, (1.0, 1.0), [0.5, 0.0, 0.5], &[1.0]).is_err());
        let bad_tol = DormandPrince45::with_tolerances(0.0, 1e-6);
        assert!(integrate_adaptive(&bad_tol, 10.0, &p, &[0.0]).is_err());
    }

    #[test]
    fn test_step_limit_reports_failure() {
        let solver = DormandPrince45 {
            max_steps: 3,
            ..DormandPrince45::default()
        }
        .with_max_step(0.01);
        let r = integrate_adaptive(&solver, 10.0, &decay_params(), &[0.0, 10.0]);
        assert!(matches!(r, Err(StarFormationError::SolverFailure(_))));
    }

    #[test]
    fn test_trajectory_from_solution_orientations() {
        let t = DVector::from_vec(vec![0.0, 1.0]);
        let by_rows = DMatrix::from_row_slice(2, 3, &[0.1, 0.2, 0.7, 0.3, 0.2, 0.5]);
        let by_cols = by_rows.transpose();
        let a = trajectory_from_solution(&t, &by_rows).unwrap();
        let b = trajectory_from_solution(&t, &by_cols).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.final_state().unwrap(), State::new(0.3, 0.2, 0.5));
        let wrong = DMatrix::<f64>::zeros(4, 4);
        assert!(trajectory_from_solution(&t, &wrong).is_err());
    }

    #[test]
    fn test_symbolic_backend_matches_dormand_prince() {
        let p = ParameterSet::new(10.0, 10.0, 1.0, 0.15, 0.15);
        let samples = linspace(0.0, 10.0, 101);
        let symbolic = SymbolicRK45 {
            rtol: 1e-6,
            atol: 1e-9,
            max_step: 0.05,
        };
        let traj = integrate_adaptive(&symbolic, 10.0, &p, &samples).unwrap();
        assert_eq!(traj.len(), 101);
        assert_eq!(traj.t(), samples.as_slice());
        assert_eq!(traj.initial_state().unwrap(), p.initial_state());
        assert!(traj.check_finite().is_ok());

        let reference = integrate_adaptive(&DormandPrince45::with_tolerances(1e-8, 1e-10), 10.0, &p, &samples).unwrap();
        let deviation = traj.max_deviation_from(&reference).unwrap();
        assert!(deviation < 1e-2, "max deviation {}", deviation);

        let integrator = AdaptiveIntegrator::new(AdaptiveBackend::Symbolic(symbolic));
        let sampled = integrator.integrate(10.0, 0.1, &p).unwrap();
        assert_eq!(sampled.len(), 100);
        assert_eq!(sampled.final_time(), Some(10.0));
    }

    #[test]
    fn test_integrator_rejects_huge_sample_count() {
        let p = decay_params();
        assert!(matches!(
            AdaptiveIntegrator::default().integrate(1e10, 1e-10, &p),
            Err(StarFormationError::InvalidInput(_))
        ));
    }
}
