//! # gcodelink
//!
//! Streams G-code programs to a printer or CNC controller over a serial link
//! and extracts the toolpath a program describes.
//!
//! ## Architecture
//!
//! gcodelink is organized as a workspace with multiple crates:
//!
//! 1. **gcodelink-core** - Positions, printer status, errors, event bus
//! 2. **gcodelink-visualizer** - Instruction parsing, path extraction, file loading
//! 3. **gcodelink-communication** - Serial channel session and command streaming
//! 4. **gcodelink-settings** - Configuration file and validation
//! 5. **gcodelink** - Command line binary that integrates all crates

use std::path::Path;

pub use gcodelink_core::{
    event_bus, AppEvent, ConnectionError, ControllerError, Error, EventBus, GcodeError,
    PrinterStatus, Position, Result, StreamEvent,
};

pub use gcodelink_visualizer::{
    extract_path, is_allowed_extension, parse_lines, parse_str, CanonicalCommand,
    GcodeFileReader, LoadedProgram, PathBounds, PathPoint,
};

pub use gcodelink_communication::{
    list_ports, Acknowledgment, ChannelSession, CommandStreamer, ConnectionParams,
    SerialPortInfo, StatusSink, StreamHandle, StreamOptions, TransferResult, TransferStatus,
};

pub use gcodelink_settings::{Config, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Load a program file after checking its extension
///
/// # Errors
/// [`GcodeError::FileError`] when the extension is not in `allowed`, or any
/// error from reading the file.
pub fn load_program(path: &Path, allowed: &[String]) -> Result<LoadedProgram> {
    if !is_allowed_extension(path, allowed) {
        return Err(GcodeError::FileError {
            reason: format!(
                "{} is not a program file (allowed: {})",
                path.display(),
                allowed.join(", ")
            ),
        }
        .into());
    }

    GcodeFileReader::new(path)?.load()
}

/// Record `file` as recently streamed and save it to `config_path`
///
/// Nothing is written without an explicit config path; the in-memory list is
/// still updated. Returns whether the file was saved.
pub fn remember_recent_file(
    config: &mut Config,
    config_path: Option<&Path>,
    file: &Path,
) -> std::result::Result<bool, SettingsError> {
    config.add_recent_file(file.to_path_buf());
    match config_path {
        Some(path) => config.save_to_file(path).map(|_| true),
        None => Ok(false),
    }
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - stderr output, so command output on stdout stays machine readable
/// - RUST_LOG environment variable support, INFO by default
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
