//! Startup validation: configuration problems must stop the service before
//! it accepts a single call.

use switchboard_api::{AppState, Config};
use switchboard_testing::{DirectoryBuilder, EmployeeBuilder};

fn config_for(dir: &std::path::Path, directory: &DirectoryBuilder) -> Config {
    Config {
        api_key: Some("secret123".to_string()),
        directory_path: directory.write_to(dir).expect("write directory"),
        transaction_log_path: dir.join("transactions.log"),
        ..Config::default()
    }
}

#[test]
fn missing_directory_file_fails_startup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config {
        directory_path: dir.path().join("does-not-exist.json"),
        ..Config::default()
    };

    let err = AppState::from_config(&config).expect_err("startup must fail");

    assert!(format!("{err:#}").contains("E3001"));
}

#[test]
fn invalid_directory_json_fails_startup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("company_directory.json");
    std::fs::write(&path, "{\"employees\": [{\"id\": \"one\"}]}").expect("write");
    let config = Config { directory_path: path, ..Config::default() };

    let err = AppState::from_config(&config).expect_err("startup must fail");

    assert!(format!("{err:#}").contains("E3002"));
}

#[test]
fn duplicate_ids_fail_startup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let directory = DirectoryBuilder::new()
        .employee(EmployeeBuilder::new(1))
        .employee(EmployeeBuilder::new(1).name("Someone Else"));

    let err = AppState::from_config(&config_for(dir.path(), &directory))
        .expect_err("startup must fail");

    assert!(format!("{err:#}").contains("E3003"));
}

#[test]
fn unroutable_fallback_fails_startup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = config_for(dir.path(), &DirectoryBuilder::sample());
    config.fallback_employee_id = Some(3);

    let err = AppState::from_config(&config).expect_err("startup must fail");

    assert!(format!("{err:#}").contains("E3004"));
}

#[test]
fn zero_employee_id_fails_startup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("company_directory.json");
    std::fs::write(&path, r#"{"employees": [{"id": 0, "name": "Nobody", "phone": "+15550000000"}]}"#)
        .expect("write");
    let config = Config { directory_path: path, ..Config::default() };

    let err = AppState::from_config(&config).expect_err("startup must fail");

    assert!(format!("{err:#}").contains("E3002"));
}

#[test]
fn valid_configuration_builds_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = config_for(dir.path(), &DirectoryBuilder::sample());
    config.fallback_employee_id = Some(2);

    let state = AppState::from_config(&config).expect("state");

    assert_eq!(state.directory().len(), 5);
    assert!(!state.api_key.is_development());
}
