use parity::config::HookConfig;
use parity::pipeline::FailurePolicy;
use parity::{EnvironmentName, EnvironmentRoles, ParityError, Settings};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_loading() {
    let settings = Settings::from_file("tests/fixtures/parity.toml").unwrap();

    assert_eq!(settings.failure_policy, FailurePolicy::Halt);
    assert_eq!(settings.platform.redis_url_var, "REDISCLOUD_URL");
    assert_eq!(settings.deploy.branch, "main");
    assert_eq!(settings.restore.jobs, 4);
    assert_eq!(
        settings.restore.hooks,
        vec![HookConfig {
            name: "mask_test_data".to_string(),
            command: vec![
                "bundle".to_string(),
                "exec".to_string(),
                "rake".to_string(),
                "mask_test_data".to_string(),
            ],
        }]
    );
}

#[test]
fn test_protected_environments_from_file() {
    let settings = Settings::from_file("tests/fixtures/parity.toml").unwrap();
    let roles = EnvironmentRoles::from_settings(&settings.environments);

    assert!(roles.is_protected(&EnvironmentName::from("demo")));
    assert!(!roles.is_protected(&EnvironmentName::from("staging")));
    assert!(roles.is_production(&EnvironmentName::from("production")));
}

#[test]
fn test_config_missing_file() {
    let result = Settings::from_file("nonexistent.toml");
    assert!(matches!(result, Err(ParityError::Io(_))));
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let err = Settings::load(Some(Path::new("does/not/exist.toml"))).unwrap_err();

    assert!(err.is_configuration());
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_invalid_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("parity.toml");
    fs::write(&path, "[restore\njobs = 4\n").unwrap();

    let result = Settings::from_file(&path);
    assert!(matches!(result, Err(ParityError::Toml(_))));
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("parity.toml");
    fs::write(
        &path,
        "[[restore.hooks]]\nname = \"noop\"\ncommand = []\n",
    )
    .unwrap();

    let err = Settings::from_file(&path).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("noop"));

    fs::write(
        &path,
        "[environments]\ndevelopment = \"production\"\n",
    )
    .unwrap();
    assert!(Settings::from_file(&path).unwrap_err().is_configuration());
}

#[test]
fn test_empty_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("parity.toml");
    fs::write(&path, "").unwrap();

    assert_eq!(Settings::from_file(&path).unwrap(), Settings::default());
}
