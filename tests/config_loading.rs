//! Configuration file loading, including environment overrides.

use std::io::Write;

use serial_test::serial;
use sxm_cits::config::{CitsConfig, ConfigError};
use sxm_cits::CitsError;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
[application]
name = "lab-b"
log_level = "warn"

[frame]
center_x = 0.0
center_y = 0.0
range = 500.0
angle = 0.0

[[areas]]
x_dev = 10.0
y_dev = 10.0
dx = 5.0
dy = 5.0
nx = 2
ny = 2
"#;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_load_from_file() {
    let file = write_config(CONFIG);
    let config = CitsConfig::load_from(file.path()).unwrap();

    assert_eq!(config.application.name, "lab-b");
    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.areas.len(), 1);

    let plan = config.build_plan().unwrap();
    let xy: Vec<(f64, f64)> = plan.iter().map(|p| (p.x, p.y)).collect();
    assert_eq!(xy, vec![(10.0, 10.0), (10.0, 15.0), (15.0, 15.0), (15.0, 10.0)]);
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let file = write_config(CONFIG);
    std::env::set_var("SXMCITS_FRAME__ANGLE", "90.0");
    std::env::set_var("SXMCITS_APPLICATION__LOG_LEVEL", "debug");
    let result = CitsConfig::load_from(file.path());
    std::env::remove_var("SXMCITS_FRAME__ANGLE");
    std::env::remove_var("SXMCITS_APPLICATION__LOG_LEVEL");

    let config = result.unwrap();
    assert_eq!(config.frame.angle, 90.0);
    assert_eq!(config.application.log_level, "debug");

    let first = config.build_plan().unwrap().points()[0];
    assert!((first.x + 10.0).abs() < 1e-9 && (first.y - 10.0).abs() < 1e-9);
}

#[test]
#[serial]
fn test_env_override_is_validated() {
    let file = write_config(CONFIG);
    std::env::set_var("SXMCITS_FRAME__RANGE", "0");
    let result = CitsConfig::load_from(file.path());
    std::env::remove_var("SXMCITS_FRAME__RANGE");

    assert!(matches!(
        result,
        Err(ConfigError::Engine(CitsError::InvalidFrame { field: "range", .. }))
    ));
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = CitsConfig::load_from(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, CitsConfig::default());
}

#[test]
#[serial]
fn test_malformed_area_is_a_load_error() {
    let file = write_config("[[areas]]\nx_dev = \"left\"\n");
    assert!(matches!(
        CitsConfig::load_from(file.path()),
        Err(ConfigError::Load(_))
    ));
}

#[test]
#[serial]
fn test_rendered_default_reloads() {
    let file = write_config(&CitsConfig::default().to_toml().unwrap());
    let config = CitsConfig::load_from(file.path()).unwrap();
    assert_eq!(config, CitsConfig::default());
}
