//! Config file loading, error messages, and merge behaviour.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use rssync_core::{
    config::{self, ConfigOverrides},
    ConfigError, RunConfig,
};

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn missing_default_config_is_empty() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let file = config::load_default_at(home.path()).expect("load");
    assert_eq!(file, config::ConfigFile::default());
}

#[test]
fn unreadable_explicit_config_reports_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let path = home.path().join("nope.yaml");
    let err = config::load_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "got: {err}");
    assert!(err.to_string().contains("nope.yaml"));
}

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let file = home.child(".rssync/config.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_default_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn unknown_keys_are_rejected() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let file = home.child("config.yaml");
    file.write_str("endpoint: http://x\nendpiont: typo\n").expect("write");

    let err = config::load_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Merge
// ---------------------------------------------------------------------------

#[test]
fn default_config_feeds_run_config() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let file = home.child(".rssync/config.yaml");
    file.write_str(
        "endpoint: http://reports.local/ReportServer/ReportService2010.asmx\n\
         username: DOMAIN\\svc\n\
         root: /Finance/\n\
         timeout_secs: 30\n\
         properties:\n  env: dev\n  datasource.main.connectString: Data Source=(local)\n",
    )
    .expect("write");
    file.assert(predicate::path::exists());

    let loaded = config::load_default_at(home.path()).expect("load");
    let overrides = ConfigOverrides {
        properties: vec!["env=prod".to_string()],
        ..ConfigOverrides::default()
    };
    let run = RunConfig::resolve("layout.xml", loaded, overrides).expect("resolve");

    assert_eq!(run.root, "/Finance");
    assert_eq!(run.username.as_deref(), Some("DOMAIN\\svc"));
    assert_eq!(run.timeout.as_secs(), 30);
    assert_eq!(run.properties.get("env"), Some("prod"));
    assert_eq!(
        run.properties.get("datasource.main.connectString"),
        Some("Data Source=(local)")
    );
    assert_eq!(
        run.require_endpoint().expect("endpoint"),
        "http://reports.local/ReportServer/ReportService2010.asmx"
    );
}

#[test]
fn malformed_cli_property_aborts_resolution() {
    let overrides = ConfigOverrides {
        properties: vec!["no-equals-sign".to_string()],
        ..ConfigOverrides::default()
    };
    let err = RunConfig::resolve("layout.xml", config::ConfigFile::default(), overrides)
        .unwrap_err();
    assert!(err.to_string().contains("no-equals-sign"));
}
