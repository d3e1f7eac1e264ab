//! TOML-based configuration for scriv.
//!
//! Supports a config file (scriv.toml) with environment variable expansion
//! in the worker path.
//!
//! Example configuration:
//! ```toml
//! [worker]
//! enabled = true
//! path = "${SCRIV_HOME}/bin/scriv-worker"
//! timeout_ms = 7000
//!
//! [format]
//! indent = 2
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::worker::DEFAULT_TIMEOUT_MS;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Worker process configuration.
    pub worker: WorkerSettings,

    /// JSON formatting configuration.
    pub format: FormatSettings,
}

/// Worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Whether to use the worker process at all. When false every operation
    /// runs in-process.
    pub enabled: bool,

    /// Path to the worker binary (supports `${VAR}` expansion). When unset
    /// the client searches common locations.
    pub path: Option<String>,

    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl WorkerSettings {
    /// Configured worker path with environment variables expanded.
    ///
    /// Returns `None` when no path is configured or a referenced variable
    /// is missing; the client then falls back to its search candidates.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        let path = self.path.as_ref()?;
        expand_env_vars(path).ok().map(PathBuf::from)
    }
}

/// JSON formatting settings, shared by the worker and the local fallback so
/// both execution paths produce identical output.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FormatSettings {
    /// Indent width for pretty-printed output.
    pub indent: usize,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl FormatSettings {
    /// Convert to worker command-line arguments.
    pub fn to_worker_args(&self) -> Vec<String> {
        vec!["--indent".to_string(), self.indent.to_string()]
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SCRIV_CONFIG`
    /// 2. `./scriv.toml`
    /// 3. `~/.config/scriv/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SCRIV_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("scriv.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("scriv").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // No config file found
        Ok(Settings::default())
    }
}

/// Expand `${VAR}` references in a string.
///
/// An unterminated `${` is kept literally.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                let value =
                    env::var(name).map_err(|_| SettingsError::MissingEnvVar(name.to_string()))?;
                result.push_str(&value);
                rest = &after[end + 1..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    result.push_str(rest);
    Ok(result)
}
