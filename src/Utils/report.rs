//! Reporting of integration results as prettytable tables for the terminal.
use crate::StarFormation::sweep::SweepResult;
use crate::StarFormation::trajectory::Trajectory;
use prettytable::{Cell, Row, Table, row};

/// One row per sweep case, one period column per method; "-" marks a missing estimate.
pub fn sweep_table(result: &SweepResult) -> Table {
    let mut table = Table::new();
    let mut header = vec![Cell::new("Case"), Cell::new("alpha")];
    header.extend(result.methods.iter().map(|m| Cell::new(&format!("period ({})", m.method))));
    table.add_row(Row::new(header));

    let labels = result.labels();
    let alphas = result.alphas();
    for (i, label) in labels.iter().enumerate() {
        let mut cells = vec![Cell::new(label), Cell::new(&format!("{:.2}", alphas[i]))];
        for method in &result.methods {
            let text = match method.points.get(i).and_then(|p| p.period) {
                Some(period) => format!("{:.4}", period),
                None => "-".to_string(),
            };
            cells.push(Cell::new(&text));
        }
        table.add_row(Row::new(cells));
    }
    table
}

pub fn print_sweep(result: &SweepResult) {
    println!("Limit period, T = {}, dt = {}", result.horizon, result.dt);
    sweep_table(result).printstd();
}

/// initial and final state, time span and mass balance of a trajectory
pub fn trajectory_table(name: &str, trajectory: &Trajectory) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Quantity", name]);
    table.add_row(row!["samples", trajectory.len()]);
    if let (Some(first), Some(last)) = (trajectory.initial_state(), trajectory.final_state()) {
        let t_end = trajectory.final_time().unwrap_or(0.0);
        table.add_row(row!["t end", format!("{:.4}", t_end)]);
        table.add_row(row!["a(0) / a(end)", format!("{:.6} / {:.6}", first.a, last.a)]);
        table.add_row(row!["m(0) / m(end)", format!("{:.6} / {:.6}", first.m, last.m)]);
        table.add_row(row!["s(0) / s(end)", format!("{:.6} / {:.6}", first.s, last.s)]);
        table.add_row(row!["max |a+m+s-1|", format!("{:.3e}", trajectory.max_mass_drift())]);
    }
    table
}

pub fn print_trajectory(name: &str, trajectory: &Trajectory) {
    trajectory_table(name, trajectory).printstd();
}
