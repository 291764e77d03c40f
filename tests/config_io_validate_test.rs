use std::fs;
use vool_modbus::config::Config;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.name = Some("Garage".to_string());
    cfg.modbus.host = "10.0.0.5".to_string();
    cfg.modbus.slave_id = 3;
    cfg.logging.file = path.with_extension("log").to_string_lossy().to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.modbus.host, "10.0.0.5");
    assert_eq!(loaded.modbus.slave_id, 3);
    assert_eq!(loaded.title(), "Garage");
    assert_eq!(loaded.logging.file, cfg.logging.file);
}

#[test]
fn minimal_setup_file_fills_defaults() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"modbus:\n  host: charger.local\n").unwrap();
    let cfg = Config::from_file(tmp.path()).unwrap();

    assert_eq!(cfg.modbus.host, "charger.local");
    assert_eq!(cfg.modbus.port, 502);
    assert_eq!(cfg.modbus.slave_id, 1);
    assert_eq!(cfg.poll_interval_secs, 5);
    assert!(cfg.validate().is_ok());
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();

    // Empty host
    cfg.modbus.host.clear();
    assert!(cfg.validate().is_err());

    // Invalid port
    cfg = Config::default();
    cfg.modbus.port = 0;
    assert!(cfg.validate().is_err());

    // Slave id out of range
    cfg = Config::default();
    cfg.modbus.slave_id = 0;
    assert!(cfg.validate().is_err());
    cfg.modbus.slave_id = 248;
    assert!(cfg.validate().is_err());
    cfg.modbus.slave_id = 247;
    assert!(cfg.validate().is_ok());

    // Poll interval zero
    cfg = Config::default();
    cfg.poll_interval_secs = 0;
    assert!(cfg.validate().is_err());

    // Unknown log level
    cfg = Config::default();
    cfg.logging.level = "LOUD".to_string();
    assert!(cfg.validate().is_err());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}

#[test]
fn from_missing_file_is_io_error() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(tmp_dir.path().join("absent.yaml")).unwrap_err();
    assert!(format!("{}", err).contains("I/O error"));
}
