//! Configuration module.

mod settings;

pub use settings::{expand_env_vars, FormatSettings, Settings, SettingsError, WorkerSettings};
