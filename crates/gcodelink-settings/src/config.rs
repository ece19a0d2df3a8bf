//! Configuration management
//!
//! Settings live in one file, JSON or TOML by extension. Missing sections and
//! fields fall back to their defaults so a hand-written file only needs the
//! values it changes.

use crate::error::{Result, SettingsError};
use gcodelink_communication::{
    ConnectionParams, StreamOptions, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory under the platform config dir
pub const CONFIG_DIR_NAME: &str = "gcodelink";

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Device connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Port to open when none is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Baud rate
    pub baud_rate: u32,
    /// Read timeout for one response line, in milliseconds
    pub timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ConnectionSettings {
    /// Build connection parameters, preferring `port` over the configured one
    pub fn connection_params(&self, port: Option<&str>) -> Result<ConnectionParams> {
        let port = port
            .or(self.port.as_deref())
            .ok_or_else(|| SettingsError::invalid("connection.port", "no port configured"))?;

        Ok(ConnectionParams::new(port)
            .with_baud_rate(self.baud_rate)
            .with_timeout_ms(self.timeout_ms))
    }
}

/// Streaming behavior settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSettings {
    /// Abort the job when a command gets no response
    pub halt_on_missing_ack: bool,
    /// Commands between progress log lines
    pub progress_log_interval: usize,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        let options = StreamOptions::default();
        Self {
            halt_on_missing_ack: options.halt_on_missing_ack,
            progress_log_interval: options.progress_log_interval,
        }
    }
}

impl From<&StreamingSettings> for StreamOptions {
    fn from(settings: &StreamingSettings) -> Self {
        StreamOptions {
            halt_on_missing_ack: settings.halt_on_missing_ack,
            progress_log_interval: settings.progress_log_interval,
        }
    }
}

/// Program file settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    /// Extensions accepted for program files
    pub allowed_extensions: Vec<String>,
    /// Most recently streamed files, newest first
    pub recent_files: Vec<PathBuf>,
    /// Maximum length of `recent_files`
    pub max_recent_files: usize,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["gcode".to_string(), "txt".to_string()],
            recent_files: Vec::new(),
            max_recent_files: 10,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Streaming settings
    pub streaming: StreamingSettings,
    /// File settings
    pub files: FileSettings,
}

#[derive(Clone, Copy)]
enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> Result<Format> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    if ext.eq_ignore_ascii_case("json") {
        Ok(Format::Json)
    } else if ext.eq_ignore_ascii_case("toml") {
        Ok(Format::Toml)
    } else {
        Err(SettingsError::UnsupportedFormat(path.display().to_string()))
    }
}

/// Path of the config file in the platform config directory
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| SettingsError::ConfigDirectory("no config directory on this platform".into()))
}

impl Config {
    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Load `path`, or the default config file, falling back to defaults
    ///
    /// An explicitly given path must exist. The default file is optional.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        let path = default_config_path()?;
        if path.is_file() {
            Self::load_from_file(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.connection.baud_rate == 0 {
            return Err(SettingsError::invalid("connection.baud_rate", "must be > 0"));
        }

        if self.connection.timeout_ms == 0 {
            return Err(SettingsError::invalid("connection.timeout_ms", "must be > 0"));
        }

        if self
            .connection
            .port
            .as_deref()
            .is_some_and(|port| port.trim().is_empty())
        {
            return Err(SettingsError::invalid("connection.port", "must not be blank"));
        }

        if self.files.allowed_extensions.is_empty() {
            return Err(SettingsError::invalid(
                "files.allowed_extensions",
                "at least one extension is required",
            ));
        }

        Ok(())
    }

    /// Add file to recent files list
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.files.recent_files.retain(|f| f != &path);
        self.files.recent_files.insert(0, path);
        self.files.recent_files.truncate(self.files.max_recent_files);
    }

    /// Streaming options for the command streamer
    pub fn stream_options(&self) -> StreamOptions {
        StreamOptions::from(&self.streaming)
    }
}
