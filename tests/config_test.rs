//! Integration tests for Settings loading.
//!
//! Precedence: defaults → config file → SASCLI_* environment variables.
//! Every test passes an explicit config file, so no user config is read.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tempfile::TempDir;

use sascli::application::ApplicationError;
use sascli::config::Settings;

/// Serializes tests that read or write SASCLI_* variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_guard() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// `Settings::load` while holding the environment lock.
fn load(path: &Path) -> Result<Settings, ApplicationError> {
    let _guard = env_guard();
    Settings::load(Some(path))
}

fn write_ini(temp: &TempDir, content: &str) -> PathBuf {
    let path = temp.path().join("sascli.ini");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn given_upper_case_sections_when_load_then_values_applied() {
    let temp = TempDir::new().unwrap();
    let path = write_ini(
        &temp,
        r#"
[SESSION]
saspath = /opt/sas/bin/sas_u8
options = -encoding utf8

[LOGGING]
remote_dir = /shared/saslogs
local_dir = /mnt/saslogs

[OUTPUT]
obs = 25
"#,
    );

    let settings = load(&path).expect("load settings");

    assert_eq!(settings.session.saspath, PathBuf::from("/opt/sas/bin/sas_u8"));
    assert_eq!(settings.session.extra_args(), vec!["-encoding", "utf8"]);
    let (remote, local) = settings.logging.live_dirs().expect("both dirs set");
    assert_eq!(remote, "/shared/saslogs");
    assert_eq!(local, PathBuf::from("/mnt/saslogs").as_path());
    assert_eq!(settings.output.obs, 25);
}

#[test]
fn given_partial_file_when_load_then_defaults_fill_the_rest() {
    let temp = TempDir::new().unwrap();
    let path = write_ini(&temp, "[LOGGING]\nremote_dir = /shared/saslogs\n");

    let settings = load(&path).expect("load settings");

    assert_eq!(settings.session.saspath, PathBuf::from("sas"));
    assert_eq!(settings.output.obs, 10);
    assert_eq!(settings.logging.remote_dir.as_deref(), Some("/shared/saslogs"));
    assert!(settings.logging.live_dirs().is_none(), "local_dir missing");
}

#[test]
fn given_tilde_local_dir_when_load_then_expanded() {
    let temp = TempDir::new().unwrap();
    let path = write_ini(&temp, "[LOGGING]\nlocal_dir = ~/saslogs\n");

    let settings = load(&path).expect("load settings");

    let home = std::env::var("HOME").expect("HOME should be set");
    let local = settings.logging.local_dir.expect("local_dir set");
    assert_eq!(local, PathBuf::from(home).join("saslogs"));
}

#[test]
fn given_missing_explicit_file_when_load_then_config_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope.ini");

    let result = load(&missing);

    match result {
        Err(ApplicationError::Config { message }) => assert!(message.contains("nope.ini")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn given_env_override_when_load_then_env_wins_over_file() {
    let temp = TempDir::new().unwrap();
    let path = write_ini(&temp, "[LOGGING]\npoll_interval_ms = 200\n");

    let result = {
        let _guard = env_guard();
        std::env::set_var("SASCLI_LOGGING__POLL_INTERVAL_MS", "40");
        let result = Settings::load(Some(&path));
        std::env::remove_var("SASCLI_LOGGING__POLL_INTERVAL_MS");
        result
    };

    let settings = result.expect("load settings");
    assert_eq!(settings.logging.poll_interval(), Duration::from_millis(40));
}

#[test]
fn given_template_when_loaded_then_equals_defaults() {
    let temp = TempDir::new().unwrap();
    let path = write_ini(&temp, &Settings::template());

    let settings = load(&path).expect("template parses");

    assert_eq!(settings.session, Settings::default().session);
    assert_eq!(settings.output, Settings::default().output);
}
