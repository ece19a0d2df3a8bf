//! Event type definitions for the event bus.
//!
//! Events are grouped by category and are cloneable and serializable so they
//! can be logged or forwarded to an external status collaborator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::data::PrinterStatus;

/// Root event enum for all application events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    /// Device connection events
    Connection(ConnectionEvent),
    /// Command streaming events
    Stream(StreamEvent),
    /// G-code file operations
    File(FileEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Connection(_) => EventCategory::Connection,
            AppEvent::Stream(_) => EventCategory::Stream,
            AppEvent::File(_) => EventCategory::File,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Connection(e) => e.description(),
            AppEvent::Stream(e) => e.description(),
            AppEvent::File(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Device connection events.
    Connection,
    /// Command streaming events.
    Stream,
    /// G-code file operation events.
    File,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Connection => write!(f, "Connection"),
            EventCategory::Stream => write!(f, "Stream"),
            EventCategory::File => write!(f, "File"),
        }
    }
}

/// Reason for disconnection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// User requested disconnect
    UserRequested,
    /// Replaced by a new connection
    Reconnect,
    /// Connection lost unexpectedly
    ConnectionLost,
}

/// Connection-related events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConnectionEvent {
    /// Starting connection attempt.
    Connecting {
        /// Serial port path being connected to.
        port: String,
    },
    /// Successfully connected.
    Connected {
        /// Serial port path that was connected.
        port: String,
        /// Configured baud rate.
        baud_rate: u32,
    },
    /// Disconnected from device.
    Disconnected {
        /// Serial port path that was disconnected.
        port: String,
        /// Reason for the disconnection.
        reason: DisconnectReason,
    },
    /// Connection attempt failed.
    ConnectionFailed {
        /// Serial port path that failed to connect.
        port: String,
        /// Error message describing the failure.
        error: String,
    },
}

impl ConnectionEvent {
    fn description(&self) -> String {
        match self {
            ConnectionEvent::Connecting { port } => format!("Connecting to {}", port),
            ConnectionEvent::Connected { port, baud_rate } => {
                format!("Connected to {} @ {} baud", port, baud_rate)
            }
            ConnectionEvent::Disconnected { port, reason } => {
                format!("Disconnected from {}: {:?}", port, reason)
            }
            ConnectionEvent::ConnectionFailed { port, error } => {
                format!("Connection failed to {}: {}", port, error)
            }
        }
    }
}

/// Command streaming events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StreamEvent {
    /// A job started streaming.
    Started {
        /// Number of commands in the job.
        total: usize,
    },
    /// Status after a command completed.
    Progress(PrinterStatus),
    /// Every command was sent.
    Finished {
        /// Number of commands sent.
        sent: usize,
        /// Wall-clock duration of the job.
        duration: Duration,
    },
    /// The job stopped early.
    Aborted {
        /// Zero-based index of the command that failed.
        index: usize,
        /// Why the job stopped.
        reason: String,
    },
    /// The job was requested without an open session.
    NotConnected,
}

impl StreamEvent {
    fn description(&self) -> String {
        match self {
            StreamEvent::Started { total } => format!("Stream started: {} commands", total),
            StreamEvent::Progress(status) => format!("Progress: {}", status),
            StreamEvent::Finished { sent, duration } => {
                format!("Stream finished: {} commands in {:?}", sent, duration)
            }
            StreamEvent::Aborted { index, reason } => {
                format!("Stream aborted at command {}: {}", index, reason)
            }
            StreamEvent::NotConnected => "Stream refused: not connected".to_string(),
        }
    }
}

/// G-code file events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FileEvent {
    /// File loaded and parsed.
    Loaded {
        /// Path to the loaded file.
        path: PathBuf,
        /// Number of canonical commands.
        commands: usize,
    },
    /// Path extracted for visualization.
    PathExtracted {
        /// Number of path points.
        points: usize,
    },
}

impl FileEvent {
    fn description(&self) -> String {
        match self {
            FileEvent::Loaded { path, commands } => {
                format!("Loaded: {} ({} commands)", path.display(), commands)
            }
            FileEvent::PathExtracted { points } => format!("Path extracted: {} points", points),
        }
    }
}
