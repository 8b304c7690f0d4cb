//! The classical scenarios of the star formation study, printed as tables.
use crate::StarFormation::adaptive::AdaptiveIntegrator;
use crate::StarFormation::fixed_step::{ForwardEuler, RungeKutta4};
use crate::StarFormation::integrator::{IntegrationMethod, Integrator};
use crate::StarFormation::parameter_sets::{
    EULER_PERIOD_RUN, METHOD_COMPARISON_RUN, PHASE_PLANE_RUN, RunSettings, TIME_SERIES_RUN,
    alpha_sweep_cases, phase_portrait_cases,
};
use crate::StarFormation::sf_error::StarFormationError;
use crate::StarFormation::sweep::{SweepResult, run_sweep_lenient};
use crate::StarFormation::trajectory::Trajectory;
use crate::Utils::report::{print_sweep, print_trajectory};
use log::info;
use prettytable::{Table, row};

fn euler_runs(settings: &RunSettings) -> Result<Vec<(String, Trajectory)>, StarFormationError> {
    phase_portrait_cases()
        .iter()
        .map(|case| {
            ForwardEuler::new()
                .integrate(settings.horizon, settings.dt, &case.params)
                .map(|traj| (case.label.clone(), traj))
        })
        .collect()
}

/// Euler time series of a(t), m(t), s(t) for the six cases
pub fn time_series() -> Result<(), StarFormationError> {
    for (label, traj) in euler_runs(&TIME_SERIES_RUN)? {
        print_trajectory(&label, &traj);
    }
    Ok(())
}

fn range(v: &[f64]) -> String {
    let min = v.iter().copied().fold(f64::INFINITY, f64::min);
    let max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    format!("[{:.4}, {:.4}]", min, max)
}

/// extent and end point of the (a, m) orbit of each case
pub fn phase_plane() -> Result<(), StarFormationError> {
    let mut table = Table::new();
    table.add_row(row!["Case", "a range", "m range", "final (a, m)"]);
    for (label, traj) in euler_runs(&PHASE_PLANE_RUN)? {
        let last = traj
            .final_state()
            .map(|s| format!("({:.4}, {:.4})", s.a, s.m))
            .unwrap_or_default();
        table.add_row(row![label, range(traj.a()), range(traj.m()), last]);
    }
    table.printstd();
    Ok(())
}

fn comparison(
    settings: &RunSettings,
    methods: Vec<IntegrationMethod>,
) -> Result<SweepResult, StarFormationError> {
    info!(
        "limit period sweep: T = {}, dt = {}, {} methods",
        settings.horizon,
        settings.dt,
        methods.len()
    );
    let result = run_sweep_lenient(settings, &methods, &alpha_sweep_cases())?;
    print_sweep(&result);
    Ok(result)
}

pub fn euler_period_sweep() -> Result<(), StarFormationError> {
    comparison(&EULER_PERIOD_RUN, vec![ForwardEuler::new().into()]).map(|_| ())
}

pub fn euler_vs_rk4() -> Result<(), StarFormationError> {
    comparison(
        &METHOD_COMPARISON_RUN,
        vec![ForwardEuler::new().into(), RungeKutta4::new().into()],
    )
    .map(|_| ())
}

pub fn three_method_comparison() -> Result<(), StarFormationError> {
    comparison(
        &METHOD_COMPARISON_RUN,
        vec![
            ForwardEuler::new().into(),
            RungeKutta4::new().into(),
            AdaptiveIntegrator::default().into(),
        ],
    )
    .map(|_| ())
}
