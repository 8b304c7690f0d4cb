use super::cli_scenarios::{
    euler_period_sweep, euler_vs_rk4, phase_plane, three_method_comparison, time_series,
};
use crate::StarFormation::sf_error::StarFormationError;
use log::info;

/// The classical scenarios of the study, in their historical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    TimeSeries,
    PhasePlane,
    EulerPeriod,
    EulerVsRk4,
    MethodComparison,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::TimeSeries,
        Scenario::PhasePlane,
        Scenario::EulerPeriod,
        Scenario::EulerVsRk4,
        Scenario::MethodComparison,
    ];

    /// accepts the scenario name or its letter a ... e
    pub fn parse(name: &str) -> Option<Scenario> {
        match name.trim().to_lowercase().as_str() {
            "a" | "time-series" => Some(Scenario::TimeSeries),
            "b" | "phase-plane" => Some(Scenario::PhasePlane),
            "c" | "euler-period" => Some(Scenario::EulerPeriod),
            "d" | "euler-vs-rk4" => Some(Scenario::EulerVsRk4),
            "e" | "compare" => Some(Scenario::MethodComparison),
            _ => None,
        }
    }

    pub fn run(&self) -> Result<(), StarFormationError> {
        match self {
            Scenario::TimeSeries => time_series(),
            Scenario::PhasePlane => phase_plane(),
            Scenario::EulerPeriod => euler_period_sweep(),
            Scenario::EulerVsRk4 => euler_vs_rk4(),
            Scenario::MethodComparison => three_method_comparison(),
        }
    }
}

/// Scenarios named by `args`, every scenario when `args` is empty.
pub fn select_scenarios(args: &[String]) -> Result<Vec<Scenario>, StarFormationError> {
    if args.is_empty() {
        return Ok(Scenario::ALL.to_vec());
    }
    args.iter()
        .map(|arg| {
            Scenario::parse(arg).ok_or_else(|| {
                StarFormationError::InvalidInput(format!(
                    "unknown scenario '{}', expected one of a|time-series, b|phase-plane, \
                     c|euler-period, d|euler-vs-rk4, e|compare",
                    arg
                ))
            })
        })
        .collect()
}

pub fn run_scenarios(args: &[String]) -> Result<(), StarFormationError> {
    for scenario in select_scenarios(args)? {
        println!("\x1b[34m\n=== {:?} ===\x1b[0m", scenario);
        info!("running scenario {:?}", scenario);
        scenario.run()?;
    }
    Ok(())
}
