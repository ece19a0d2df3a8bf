//! Error handling for gcodelink
//!
//! Provides error types for every layer of the engine:
//! - Connection errors (opening and owning the device channel)
//! - Controller errors (transmitting commands and collecting acknowledgments)
//! - G-Code errors (path extraction and file loading)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Connection error type
///
/// Represents failures to establish or hold the serial channel to the device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Port not found
    #[error("Port not found: {port}")]
    PortNotFound {
        /// The name of the port that was not found.
        port: String,
    },

    /// Port is already in use
    #[error("Port already in use: {port}")]
    PortInUse {
        /// The name of the port that is in use.
        port: String,
    },

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Baud rate not supported
    #[error("Baud rate {baud} not supported")]
    UnsupportedBaudRate {
        /// The unsupported baud rate.
        baud: u32,
    },

    /// Invalid connection parameters
    #[error("Invalid connection parameters: {reason}")]
    InvalidParameters {
        /// The reason the parameters are invalid.
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {reason}")]
    IoError {
        /// The reason for the I/O error.
        reason: String,
    },
}

/// Controller error type
///
/// Represents failures while exchanging commands with an open channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// No open session to talk to
    #[error("Controller not connected")]
    NotConnected,

    /// Writing the command to the channel failed
    #[error("Failed to transmit '{command}': {reason}")]
    Transmit {
        /// The command that could not be written.
        command: String,
        /// The underlying I/O failure.
        reason: String,
    },

    /// No acknowledgment arrived within the read timeout
    #[error("No response within {timeout_ms}ms")]
    ResponseTimeout {
        /// The read timeout in milliseconds.
        timeout_ms: u64,
    },

    /// Reading the response failed with an I/O error
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// The underlying I/O failure.
        reason: String,
    },
}

/// G-Code error type
///
/// Represents errors raised while deriving path geometry or loading files.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GcodeError {
    /// A coordinate field held a non-numeric value
    #[error("Malformed coordinate '{field}' in command {command_index}: {command}")]
    MalformedCoordinate {
        /// Zero-based index of the offending command.
        command_index: usize,
        /// The full command text.
        command: String,
        /// The field that failed to parse.
        field: String,
    },

    /// No linear-motion commands were found
    #[error("No motion commands found")]
    EmptyPath,

    /// File reading error
    #[error("File error: {reason}")]
    FileError {
        /// The reason for the file error.
        reason: String,
    },
}

/// Main error type for gcodelink
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Controller error
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Controller(ControllerError::ResponseTimeout { .. })
        )
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a G-Code error
    pub fn is_gcode_error(&self) -> bool {
        matches!(self, Error::Gcode(_))
    }

    /// Check if this is a controller error
    pub fn is_controller_error(&self) -> bool {
        matches!(self, Error::Controller(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
