//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Config file: `--config <path>`, else `$XDG_CONFIG_HOME/sascli/sascli.ini`
//! 3. Environment variables: `SASCLI_*` prefix, `__` between section and key
//!    (e.g. `SASCLI_LOGGING__LOCAL_DIR`)
//!
//! The config file is INI. Section names may be upper case (`[LOGGING]`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::expand_env_vars;

const MIN_POLL_INTERVAL_MS: u64 = 10;

/// How to start the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Engine executable (absolute path or a name found on PATH)
    pub saspath: PathBuf,
    /// Extra engine arguments, whitespace separated
    pub options: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            saspath: PathBuf::from("sas"),
            options: String::new(),
        }
    }
}

impl SessionConfig {
    pub fn extra_args(&self) -> Vec<String> {
        self.options.split_whitespace().map(String::from).collect()
    }
}

/// Live log capture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory the engine writes run logs to, as seen by the engine host
    pub remote_dir: Option<String>,
    /// The same directory as mounted on this machine
    pub local_dir: Option<PathBuf>,
    /// Poll interval of the log tail in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            remote_dir: None,
            local_dir: None,
            poll_interval_ms: 500,
        }
    }
}

impl LoggingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    /// Both directories, when live log capture is configured.
    pub fn live_dirs(&self) -> Option<(&str, &Path)> {
        match (&self.remote_dir, &self.local_dir) {
            (Some(remote), Some(local)) if !remote.trim().is_empty() => {
                Some((remote.as_str(), local.as_path()))
            }
            _ => None,
        }
    }
}

/// Tabular output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Default row limit of `data`
    pub obs: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { obs: 10 }
    }
}

/// Unified configuration for sascli.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

/// Raw settings for intermediate parsing (`None` → not specified, keep base).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    #[serde(alias = "SESSION")]
    pub session: RawSessionConfig,
    #[serde(alias = "LOGGING")]
    pub logging: RawLoggingConfig,
    #[serde(alias = "OUTPUT")]
    pub output: RawOutputConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSessionConfig {
    pub saspath: Option<PathBuf>,
    pub options: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLoggingConfig {
    pub remote_dir: Option<String>,
    pub local_dir: Option<PathBuf>,
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawOutputConfig {
    pub obs: Option<usize>,
}

/// Get the XDG config directory for sascli.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sascli").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("sascli.ini"))
}

/// Load an INI file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let config = Config::builder()
        .add_source(File::new(&path.to_string_lossy(), FileFormat::Ini).required(true))
        .build()
        .map_err(|e| ApplicationError::Config {
            message: format!("read {}: {}", path.display(), e),
        })?;
    config.try_deserialize().map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// An explicit `config_file` must exist; the global file is optional.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        match config_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ApplicationError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                current = current.merge_with(&load_raw_settings(path)?);
            }
            None => {
                if let Some(global_path) = global_config_path() {
                    if global_path.is_file() {
                        current = current.merge_with(&load_raw_settings(&global_path)?);
                    }
                }
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Overlay values win if specified, otherwise keep base.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            session: SessionConfig {
                saspath: overlay
                    .session
                    .saspath
                    .clone()
                    .unwrap_or_else(|| self.session.saspath.clone()),
                options: overlay
                    .session
                    .options
                    .clone()
                    .unwrap_or_else(|| self.session.options.clone()),
            },
            logging: LoggingConfig {
                remote_dir: overlay
                    .logging
                    .remote_dir
                    .clone()
                    .or_else(|| self.logging.remote_dir.clone()),
                local_dir: overlay
                    .logging
                    .local_dir
                    .clone()
                    .or_else(|| self.logging.local_dir.clone()),
                poll_interval_ms: overlay
                    .logging
                    .poll_interval_ms
                    .unwrap_or(self.logging.poll_interval_ms),
            },
            output: OutputConfig {
                obs: overlay.output.obs.unwrap_or(self.output.obs),
            },
        }
    }

    /// Expand `~`, `$VAR` and `${VAR}` in local path fields.
    ///
    /// `remote_dir` is a path on the engine host and stays as written.
    fn expand_paths(&mut self) {
        let saspath = expand_env_vars(self.session.saspath.to_string_lossy().as_ref());
        self.session.saspath = PathBuf::from(saspath);

        if let Some(local) = &self.logging.local_dir {
            self.logging.local_dir = Some(PathBuf::from(expand_env_vars(
                local.to_string_lossy().as_ref(),
            )));
        }
    }

    /// Apply SASCLI_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("SASCLI")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value::<String>(&config, "session.saspath")? {
            settings.session.saspath = PathBuf::from(val);
        }
        if let Some(val) = env_value::<String>(&config, "session.options")? {
            settings.session.options = val;
        }
        if let Some(val) = env_value::<String>(&config, "logging.remote_dir")? {
            settings.logging.remote_dir = Some(val);
        }
        if let Some(val) = env_value::<String>(&config, "logging.local_dir")? {
            settings.logging.local_dir = Some(PathBuf::from(val));
        }
        if let Some(val) = env_value::<u64>(&config, "logging.poll_interval_ms")? {
            settings.logging.poll_interval_ms = val;
        }
        if let Some(val) = env_value::<usize>(&config, "output.obs")? {
            settings.output.obs = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"; sascli configuration
;
; Locations (by precedence, lowest to highest):
;   File: --config <path>, else ~/.config/sascli/sascli.ini
;   Env:  SASCLI_<SECTION>__<KEY>, e.g. SASCLI_LOGGING__LOCAL_DIR

[SESSION]
; Engine executable
; saspath = /opt/sasinside/SASHome/SASFoundation/9.4/bin/sas_u8
; Extra engine arguments
; options = -encoding utf8

[LOGGING]
; Directory the engine writes run logs to (path on the engine host)
; remote_dir = /shared/saslogs
; The same directory as mounted locally, read by `run --show-log`
; local_dir = ~/mnt/saslogs
; poll_interval_ms = 500

[OUTPUT]
; Default number of rows shown by `data`
; obs = 10
"#
        .to_string()
    }
}

/// Read one env override; `None` when the variable is not set.
fn env_value<T: DeserializeOwned>(config: &Config, key: &str) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::Config {
            message: format!("environment override {key}: {e}"),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
