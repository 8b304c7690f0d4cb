//! Common contract of all integration methods: horizon T, step (or sample spacing) dt and a
//! parameter set in, trajectory out. `IntegrationMethod` dispatches statically over the
//! concrete integrators so sweeps can hold a heterogeneous, cloneable list of methods.
use super::adaptive::AdaptiveIntegrator;
use super::fixed_step::{ForwardEuler, RungeKutta4};
use super::mass_exchange_model::ParameterSet;
use super::sf_error::StarFormationError;
use super::trajectory::Trajectory;
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
pub trait Integrator {
    /// integrates the model from t = 0 up to `horizon`
    fn integrate(
        &self,
        horizon: f64,
        dt: f64,
        params: &ParameterSet,
    ) -> Result<Trajectory, StarFormationError>;
    /// short name used in tables and logs
    fn name(&self) -> String;
}

#[derive(Debug, Clone)]
#[enum_dispatch(Integrator)]
pub enum IntegrationMethod {
    ForwardEuler(ForwardEuler),
    RungeKutta4(RungeKutta4),
    Adaptive(AdaptiveIntegrator),
}

/// Largest step count accepted by [`step_count`]; a trajectory this long already holds
/// about 1.6 GB of samples.
pub const MAX_STEP_COUNT: usize = 50_000_000;

/// Number of steps N = floor(horizon / dt), with the checks every method shares.
///
/// # Returns
/// * `Err(StarFormationError::InvalidInput)` - non-positive or non-finite horizon or step,
///   a step larger than the horizon, or more than [`MAX_STEP_COUNT`] steps
pub fn step_count(horizon: f64, dt: f64) -> Result<usize, StarFormationError> {
    if !horizon.is_finite() || horizon <= 0.0 {
        return Err(StarFormationError::InvalidInput(format!(
            "horizon must be positive, got {}",
            horizon
        )));
    }
    if !dt.is_finite() || dt <= 0.0 {
        return Err(StarFormationError::InvalidInput(format!(
            "step size must be positive, got {}",
            dt
        )));
    }
    let n = (horizon / dt).floor();
    if n < 1.0 {
        return Err(StarFormationError::InvalidInput(format!(
            "step size {} exceeds horizon {}",
            dt, horizon
        )));
    }
    if n > MAX_STEP_COUNT as f64 {
        return Err(StarFormationError::InvalidInput(format!(
            "horizon {} with step {} needs {:e} steps, at most {} allowed",
            horizon, dt, n, MAX_STEP_COUNT
        )));
    }
    Ok(n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_count() {
        assert_eq!(step_count(100.0, 0.1).unwrap(), (100.0_f64 / 0.1).floor() as usize);
        assert_eq!(step_count(10.0, 0.5).unwrap(), 20);
        assert_eq!(step_count(10.0, 3.0).unwrap(), 3);
        assert_eq!(step_count(MAX_STEP_COUNT as f64, 1.0).unwrap(), MAX_STEP_COUNT);
        assert!(step_count(MAX_STEP_COUNT as f64 + 1.0, 1.0).is_err());
    }

    #[test]
    fn test_step_count_rejects_bad_input() {
        for (horizon, dt) in [
            (0.0, 0.1),
            (-1.0, 0.1),
            (10.0, 0.0),
            (10.0, -0.1),
            (10.0, f64::NAN),
            (f64::INFINITY, 0.1),
            (1.0, 2.0),
            (1e10, 1e-10),
            (1.0, f64::MIN_POSITIVE),
        ] {
            assert!(
                matches!(step_count(horizon, dt), Err(StarFormationError::InvalidInput(_))),
                "accepted horizon {} dt {}",
                horizon,
                dt
            );
        }
    }

    #[test]
    fn test_method_names() {
        let methods: Vec<IntegrationMethod> = vec![
            ForwardEuler::new().into(),
            RungeKutta4::new().into(),
            AdaptiveIntegrator::default().into(),
        ];
        let names: Vec<String> = methods.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["Euler", "RK4", "RK45"]);
    }
}
