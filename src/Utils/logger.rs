//! Logger setup with simplelog: colored terminal output, optionally mirrored into a file.
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;

fn config() -> Config {
    ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Error)
        .build()
}

/// Terminal logger at `level`. Calling it a second time is a no-op returning an error message.
pub fn init_logger(level: LevelFilter) -> Result<(), String> {
    TermLogger::init(level, config(), TerminalMode::Mixed, ColorChoice::Auto)
        .map_err(|e| format!("Failed to initialize logger: {}", e))
}

/// Terminal logger plus a copy of every record into `log_file`.
pub fn init_logger_with_file(level: LevelFilter, log_file: &str) -> Result<(), String> {
    let file = File::create(log_file)
        .map_err(|e| format!("Failed to create log file '{}': {}", log_file, e))?;
    let loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(level, config(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, config(), file),
    ];
    CombinedLogger::init(loggers).map_err(|e| format!("Failed to initialize logger: {}", e))
}

/// "error", "warn", "info", "debug", "trace" or "off", case-insensitive
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("INFO"), Some(LevelFilter::Info));
        assert_eq!(parse_level(" warning "), Some(LevelFilter::Warn));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_init_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("star_formation.log");
        let path = path.to_str().unwrap();
        // another test may have installed the global logger already
        let _ = init_logger_with_file(LevelFilter::Info, path);
        assert!(std::path::Path::new(path).exists());
        assert!(init_logger(LevelFilter::Info).is_err());
    }
}
