//! Device channel plumbing
//!
//! Connection parameters, the link abstraction the session talks through,
//! and the session and streamer built on top of it.

pub mod serial;
pub mod session;
pub mod streamer;

use gcodelink_core::ConnectionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default baud rate for the device channel
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default per-response read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Trait for link I/O operations
///
/// Anything that reads and writes bytes and can move between threads can
/// serve as the physical link, which is how tests inject in-memory devices.
pub trait ReadWrite: std::io::Read + std::io::Write + Send {}
impl<T: std::io::Read + std::io::Write + Send> ReadWrite for T {}

/// Opens the physical link for a session
pub trait LinkOpener: Send + Sync {
    /// Open a link with the given parameters
    fn open(&self, params: &ConnectionParams) -> Result<Box<dyn ReadWrite>, ConnectionError>;
}

/// Connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Read timeout for one response line, in milliseconds
    pub timeout_ms: u64,
}

impl ConnectionParams {
    /// Parameters for a port with default baud rate and timeout
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Set baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set read timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Read timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check the parameters before touching the device
    pub fn validate(&self) -> Result<(), ConnectionError> {
        if self.port.trim().is_empty() {
            return Err(ConnectionError::InvalidParameters {
                reason: "port name is empty".to_string(),
            });
        }
        if self.baud_rate == 0 {
            return Err(ConnectionError::UnsupportedBaudRate {
                baud: self.baud_rate,
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConnectionError::InvalidParameters {
                reason: "read timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} baud (timeout {}ms)",
            self.port, self.baud_rate, self.timeout_ms
        )
    }
}
