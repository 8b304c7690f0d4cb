//! # Fixed-Step Integrators
//!
//! Explicit one-step methods with a constant time increment:
//! - [`ForwardEuler`]: `x[i+1] = x[i] + dt*f_x(a[i], m[i], s[i])`, first order
//!   (local error O(dt^2), global error O(dt))
//! - [`RungeKutta4`]: four-stage method, `x[i+1] = x[i] + (k1 + 2k2 + 2k3 + k4)*dt/6`
//!
//! Both start from `t = 0`, `(a0, m0, 1 - a0 - m0)` and perform `N = floor(T/dt)` steps,
//! so a trajectory holds `N + 1` samples. Time advances as `t[i+1] = t[i] + dt`.
//! Every rate at step i is evaluated from the same snapshot `(a[i], m[i], s[i])`.
//!
//! No step size control: a too large `dt` in a stiff regime diverges, and a fractional
//! `alpha` with negative intermediate `m` gives NaN. Both propagate into the trajectory.
//!
//! ## Stage coupling of the RK4 method
//! [`StageCoupling::Componentwise`] is the classical scheme: stage j of every component is
//! evaluated at `y + c*dt*k_{j-1}` with each component shifted by its own increment.
//! [`StageCoupling::Shared`] reproduces the historical variant of this model's reference
//! curves: while advancing component x, every stage shifts all three components by the
//! same scalar `k_x*dt/2` (the fourth stage included). That variant is only first-order
//! accurate and does not conserve a + m + s.
use super::integrator::{Integrator, step_count};
use super::mass_exchange_model::{MassExchangeModel, ParameterSet, State};
use super::sf_error::StarFormationError;
use super::trajectory::Trajectory;
use log::debug;

/// Forward (explicit) Euler method.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForwardEuler;

impl ForwardEuler {
    pub fn new() -> Self {
        ForwardEuler
    }

    /// one Euler step from a snapshot
    pub fn step(model: &MassExchangeModel, y: &[f64; 3], dt: f64) -> [f64; 3] {
        let f = model.rhs(0.0, y);
        [y[0] + dt * f[0], y[1] + dt * f[1], y[2] + dt * f[2]]
    }
}

impl Integrator for ForwardEuler {
    fn integrate(
        &self,
        horizon: f64,
        dt: f64,
        params: &ParameterSet,
    ) -> Result<Trajectory, StarFormationError> {
        let n = step_count(horizon, dt)?;
        params.validate()?;
        let model = MassExchangeModel::new(*params);
        debug!("forward Euler: T = {}, dt = {}, {} steps", horizon, dt, n);
        Ok(march(&model, n, dt, |y| Self::step(&model, y, dt)))
    }

    fn name(&self) -> String {
        "Euler".to_string()
    }
}

/// How RK4 stages perturb the state, see the module documentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StageCoupling {
    #[default]
    Componentwise,
    Shared,
}

/// Classical four-stage Runge-Kutta method.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RungeKutta4 {
    pub coupling: StageCoupling,
}

impl RungeKutta4 {
    pub fn new() -> Self {
        Self {
            coupling: StageCoupling::Componentwise,
        }
    }

    pub fn with_coupling(coupling: StageCoupling) -> Self {
        Self { coupling }
    }

    pub fn step(&self, model: &MassExchangeModel, y: &[f64; 3], dt: f64) -> [f64; 3] {
        match self.coupling {
            StageCoupling::Componentwise => classic_step(model, y, dt),
            StageCoupling::Shared => shared_stage_step(model, y, dt),
        }
    }
}

impl Integrator for RungeKutta4 {
    fn integrate(
        &self,
        horizon: f64,
        dt: f64,
        params: &ParameterSet,
    ) -> Result<Trajectory, StarFormationError> {
        let n = step_count(horizon, dt)?;
        params.validate()?;
        let model = MassExchangeModel::new(*params);
        debug!(
            "RK4 ({:?} stages): T = {}, dt = {}, {} steps",
            self.coupling, horizon, dt, n
        );
        Ok(march(&model, n, dt, |y| self.step(&model, y, dt)))
    }

    fn name(&self) -> String {
        match self.coupling {
            StageCoupling::Componentwise => "RK4".to_string(),
            StageCoupling::Shared => "RK4 (shared stages)".to_string(),
        }
    }
}

fn classic_step(model: &MassExchangeModel, y: &[f64; 3], dt: f64) -> [f64; 3] {
    let shift = |k: &[f64; 3], c: f64| -> [f64; 3] {
        [y[0] + k[0] * c, y[1] + k[1] * c, y[2] + k[2] * c]
    };
    let k1 = model.rhs(0.0, y);
    let k2 = model.rhs(0.0, &shift(&k1, dt / 2.0));
    let k3 = model.rhs(0.0, &shift(&k2, dt / 2.0));
    let k4 = model.rhs(0.0, &shift(&k3, dt));
    let mut next = [0.0; 3];
    for i in 0..3 {
        next[i] = y[i] + (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]) * dt / 6.0;
    }
    next
}

fn shared_stage_step(model: &MassExchangeModel, y: &[f64; 3], dt: f64) -> [f64; 3] {
    let shift = |k: f64| -> [f64; 3] {
        [y[0] + k * dt / 2.0, y[1] + k * dt / 2.0, y[2] + k * dt / 2.0]
    };
    let rates = model.rhs(0.0, y);
    let mut next = [0.0; 3];
    for i in 0..3 {
        let k1 = rates[i];
        let k2 = model.rhs(0.0, &shift(k1))[i];
        let k3 = model.rhs(0.0, &shift(k2))[i];
        let k4 = model.rhs(0.0, &shift(k3))[i];
        next[i] = y[i] + (k1 + 2.0 * k2 + 2.0 * k3 + k4) * dt / 6.0;
    }
    next
}

/// applies `step` n times from the initial state of the model
fn march<F>(model: &MassExchangeModel, n: usize, dt: f64, step: F) -> Trajectory
where
    F: Fn(&[f64; 3]) -> [f64; 3],
{
    let mut trajectory = Trajectory::with_capacity(n + 1);
    let mut t = 0.0;
    let mut y = model.params().initial_state().to_array();
    trajectory.push(t, State::from_array(y));
    for _ in 0..n {
        y = step(&y);
        t += dt;
        trajectory.push(t, State::from_array(y));
    }
    trajectory
}

/// forward Euler trajectory, shorthand for `ForwardEuler.integrate`
pub fn forward_euler(
    horizon: f64,
    dt: f64,
    params: &ParameterSet,
) -> Result<Trajectory, StarFormationError> {
    ForwardEuler::new().integrate(horizon, dt, params)
}

/// classical RK4 trajectory, shorthand for `RungeKutta4::new().integrate`
pub fn runge_kutta4(
    horizon: f64,
    dt: f64,
    params: &ParameterSet,
) -> Result<Trajectory, StarFormationError> {
    RungeKutta4::new().integrate(horizon, dt, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StarFormation::mass_exchange_model::{rate_a, rate_m, rate_s};
    use approx::assert_relative_eq;

    fn case1() -> ParameterSet {
        ParameterSet::new(10.0, 10.0, 1.0, 0.15, 0.15)
    }

    #[test]
    fn test_euler_first_steps_by_hand() {
        let p = case1();
        let traj = forward_euler(1.0, 0.1, &p).unwrap();
        let (a, m, s) = (0.15, 0.15, 1.0 - 0.15 - 0.15);
        let a1 = a + 0.1 * rate_a(a, m, s, &p);
        let m1 = m + 0.1 * rate_m(a, m, s, &p);
        let s1 = s + 0.1 * rate_s(m, s, &p);
        assert_eq!(traj.a()[1], a1);
        assert_eq!(traj.m()[1], m1);
        assert_eq!(traj.s()[1], s1);
        assert_eq!(traj.t()[1], 0.1);
    }

    #[test]
    fn test_initial_state_and_length() {
        let p = ParameterSet::new(8.0, 15.0, 1.5, 0.4, 0.3);
        for dt in [0.5, 0.1, 0.03] {
            let n = (10.0_f64 / dt).floor() as usize;
            for traj in [
                forward_euler(10.0, dt, &p).unwrap(),
                runge_kutta4(10.0, dt, &p).unwrap(),
                RungeKutta4::with_coupling(StageCoupling::Shared)
                    .integrate(10.0, dt, &p)
                    .unwrap(),
            ] {
                assert_eq!(traj.len(), n + 1);
                assert_eq!(traj.t()[0], 0.0);
                assert_eq!(traj.initial_state().unwrap(), State::new(0.4, 0.3, 1.0 - 0.4 - 0.3));
            }
        }
    }

    #[test]
    fn test_time_grid_is_cumulative() {
        let traj = forward_euler(1.0, 0.1, &case1()).unwrap();
        let mut t = 0.0;
        for ti in traj.t() {
            assert_eq!(*ti, t);
            t += 0.1;
        }
    }

    #[test]
    fn test_rk4_classic_step_matches_exponential_decay() {
        // with m = 0 only ds/dt = -s and da/dt = s remain: s(t) = s0*exp(-t)
        let p = ParameterSet::new(10.0, 10.0, 1.0, 0.5, 0.0);
        let traj = runge_kutta4(2.0, 0.01, &p).unwrap();
        let s_end = traj.final_state().unwrap().s;
        assert_relative_eq!(s_end, 0.5 * (-2.0_f64).exp(), epsilon = 1e-10);
        let a_end = traj.final_state().unwrap().a;
        assert_relative_eq!(a_end, 1.0 - 0.5 * (-2.0_f64).exp(), epsilon = 1e-10);
    }

    #[test]
    fn test_shared_stage_step_by_hand() {
        let p = ParameterSet::new(8.0, 15.0, 1.5, 0.4, 0.3);
        let model = MassExchangeModel::new(p);
        let y = p.initial_state().to_array();
        let dt = 0.01;
        let rk = RungeKutta4::with_coupling(StageCoupling::Shared);
        let next = rk.step(&model, &y, dt);

        let (a, m, s) = (y[0], y[1], y[2]);
        let a1 = rate_a(a, m, s, &p);
        let a2 = rate_a(a + a1 * dt / 2.0, m + a1 * dt / 2.0, s + a1 * dt / 2.0, &p);
        let a3 = rate_a(a + a2 * dt / 2.0, m + a2 * dt / 2.0, s + a2 * dt / 2.0, &p);
        let a4 = rate_a(a + a3 * dt / 2.0, m + a3 * dt / 2.0, s + a3 * dt / 2.0, &p);
        assert_eq!(next[0], a + (a1 + 2.0 * a2 + 2.0 * a3 + a4) * dt / 6.0);

        let m1 = rate_m(a, m, s, &p);
        let m2 = rate_m(a + m1 * dt / 2.0, m + m1 * dt / 2.0, s + m1 * dt / 2.0, &p);
        let m3 = rate_m(a + m2 * dt / 2.0, m + m2 * dt / 2.0, s + m2 * dt / 2.0, &p);
        let m4 = rate_m(a + m3 * dt / 2.0, m + m3 * dt / 2.0, s + m3 * dt / 2.0, &p);
        assert_eq!(next[1], m + (m1 + 2.0 * m2 + 2.0 * m3 + m4) * dt / 6.0);

        let s1 = rate_s(m, s, &p);
        let s2 = rate_s(m + s1 * dt / 2.0, s + s1 * dt / 2.0, &p);
        let s3 = rate_s(m + s2 * dt / 2.0, s + s2 * dt / 2.0, &p);
        let s4 = rate_s(m + s3 * dt / 2.0, s + s3 * dt / 2.0, &p);
        assert_eq!(next[2], s + (s1 + 2.0 * s2 + 2.0 * s3 + s4) * dt / 6.0);
    }

    #[test]
    fn test_couplings_differ() {
        let p = ParameterSet::new(8.0, 15.0, 1.5, 0.4, 0.3);
        let classic = runge_kutta4(1.0, 0.1, &p).unwrap();
        let shared = RungeKutta4::with_coupling(StageCoupling::Shared)
            .integrate(1.0, 0.1, &p)
            .unwrap();
        assert_ne!(classic.final_state(), shared.final_state());
        assert!(classic.max_mass_drift() < 1e-12);
    }

    #[test]
    fn test_large_step_diverges_without_error() {
        // the explicit scheme is unstable for dt*k >> 1; the run still completes
        let p = ParameterSet::new(10.0, 10.0, 2.0, 0.15, 0.15);
        let traj = forward_euler(100.0, 5.0, &p).unwrap();
        assert_eq!(traj.len(), 21);
        assert!(traj.check_finite().is_err());
    }

    #[test]
    fn test_invalid_input() {
        let p = case1();
        assert!(forward_euler(0.0, 0.1, &p).is_err());
        assert!(forward_euler(10.0, -0.1, &p).is_err());
        assert!(runge_kutta4(-10.0, 0.1, &p).is_err());
        let bad = ParameterSet::new(f64::NAN, 10.0, 1.0, 0.15, 0.15);
        assert!(matches!(
            runge_kutta4(10.0, 0.1, &bad),
            Err(StarFormationError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_step_count_overflow_is_rejected() {
        let p = case1();
        assert!(matches!(
            forward_euler(1e10, 1e-10, &p),
            Err(StarFormationError::InvalidInput(_))
        ));
        assert!(matches!(
            runge_kutta4(1e10, 1e-10, &p),
            Err(StarFormationError::InvalidInput(_))
        ));
        assert!(matches!(
            RungeKutta4::with_coupling(StageCoupling::Shared).integrate(1.0, 1e-300, &p),
            Err(StarFormationError::InvalidInput(_))
        ));
    }
}
