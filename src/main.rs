use StarKin::Utils::logger::{init_logger, init_logger_with_file, parse_level};
use StarKin::cli::cli_main::run_scenarios;
use log::{LevelFilter, error};

/// usage: StarKin [a|time-series b|phase-plane c|euler-period d|euler-vs-rk4 e|compare ...]
pub fn main() {
    // STARKIN_LOG selects the level, STARKIN_LOG_FILE mirrors the log into a file
    let level = std::env::var("STARKIN_LOG")
        .ok()
        .and_then(|l| parse_level(&l))
        .unwrap_or(LevelFilter::Info);
    let logger = match std::env::var("STARKIN_LOG_FILE") {
        Ok(file) => init_logger_with_file(level, &file),
        Err(_) => init_logger(level),
    };
    if let Err(e) = logger {
        eprintln!("{}", e);
    }
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run_scenarios(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
