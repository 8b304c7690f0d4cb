/// simplelog initialization
pub mod logger;
/// prettytable rendering of trajectories and sweeps
pub mod report;
