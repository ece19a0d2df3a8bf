//! gcodelink Settings Crate
//!
//! Handles application configuration: loading and saving the config file,
//! validation, and conversion into connection and streaming parameters.

pub mod config;
pub mod error;

pub use config::{
    default_config_path, Config, ConnectionSettings, FileSettings, StreamingSettings,
    CONFIG_DIR_NAME, CONFIG_FILE_NAME,
};
pub use error::{Result, SettingsError};
