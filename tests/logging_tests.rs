use tracing::Level;
use vool_modbus::config::LoggingConfig;
use vool_modbus::logging::{LogContext, get_logger_with_context, init_logging, min_level, parse_log_level};

#[test]
fn parse_levels_case_insensitive() {
    assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
    assert_eq!(parse_log_level(" Warning ").unwrap(), Level::WARN);
    assert!(parse_log_level("verbose").is_err());
}

#[test]
fn min_level_picks_more_verbose() {
    assert_eq!(min_level(Level::INFO, Level::DEBUG), Level::DEBUG);
    assert_eq!(min_level(Level::ERROR, Level::WARN), Level::WARN);
}

#[test]
fn init_logging_writes_into_configured_directory() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let config = LoggingConfig {
        file: tmp_dir.path().join("vool.log").to_string_lossy().to_string(),
        console_output: false,
        ..LoggingConfig::default()
    };

    assert!(init_logging(&config).is_ok());
    // Second call is a no-op
    assert!(init_logging(&config).is_ok());

    let logger = get_logger_with_context(LogContext::new("driver").with_slave_id(1));
    logger.info("Logging smoke test");
}
