//! Data models for positions and printer status
//!
//! This module provides:
//! - Position tracking for the X, Y and Z axes
//! - Partial position updates for selective (sticky) axis changes
//! - The printer status snapshot reported while a job is streaming

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position in 3D space
///
/// The last commanded tool location. New extraction passes start at the origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
}

impl Position {
    /// Create a new position with X, Y, Z coordinates
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The machine origin (0, 0, 0)
    pub fn origin() -> Self {
        Self::default()
    }

    /// Apply a partial update, leaving unspecified axes untouched
    pub fn apply(&mut self, update: &PartialPosition) {
        if let Some(x) = update.x {
            self.x = x;
        }
        if let Some(y) = update.y {
            self.y = y;
        }
        if let Some(z) = update.z {
            self.z = z;
        }
    }

    /// Get all axes as a tuple
    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X:{:.3} Y:{:.3} Z:{:.3}", self.x, self.y, self.z)
    }
}

/// Partial position for updating only specific axes
///
/// Each axis is represented as an `Option` where `None` means "don't change
/// this axis" and `Some(value)` means "set to value".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialPosition {
    /// X-axis position (if Some, update this axis)
    pub x: Option<f64>,
    /// Y-axis position (if Some, update this axis)
    pub y: Option<f64>,
    /// Z-axis position (if Some, update this axis)
    pub z: Option<f64>,
}

impl PartialPosition {
    /// Create a new empty partial position (all axes None)
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether no axis is set
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }
}

/// Snapshot of the printer's connection and job state
///
/// This is the `{connected, printing, progress}` record handed to status
/// sinks while a job streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterStatus {
    /// Whether a session is open
    pub connected: bool,
    /// Whether a job is currently streaming
    pub printing: bool,
    /// Job progress in percent (0-100)
    pub progress: u8,
    /// Commands acknowledged so far
    pub completed: usize,
    /// Commands in the job
    pub total: usize,
}

impl PrinterStatus {
    /// Status for a job that has completed `completed` of `total` commands
    pub fn printing(completed: usize, total: usize) -> Self {
        Self {
            connected: true,
            printing: completed < total,
            progress: percent(completed, total),
            completed,
            total,
        }
    }
}

impl fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match (self.connected, self.printing) {
            (false, _) => "disconnected",
            (true, true) => "printing",
            (true, false) => "idle",
        };
        write!(
            f,
            "{} {}% ({}/{})",
            state, self.progress, self.completed, self.total
        )
    }
}

fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed.min(total) * 100) / total) as u8
}
