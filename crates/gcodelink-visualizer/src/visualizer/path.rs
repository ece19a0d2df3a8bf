//! Toolpath extraction from canonical commands
//!
//! Walks the command list with a running position that starts at the origin.
//! Every linear move (`G1`/`G01`) updates the axes it names and appends a
//! snapshot; omitted axes keep their previous value. Nothing else moves the
//! position.

use gcodelink_core::{GcodeError, PartialPosition, Position};
use serde::{Deserialize, Serialize};

use crate::gcode::{CanonicalCommand, COMMENT_MARKER};

/// Tokens recognized as linear motion
const LINEAR_MOTION_TOKENS: [&str; 2] = ["G1", "G01"];

/// Snapshot of the tool position after one linear move
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
    /// Index of the command that produced this point
    pub command_index: usize,
}

impl PathPoint {
    fn at(position: Position, command_index: usize) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            command_index,
        }
    }

    /// Coordinates as a position
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y, self.z)
    }

    /// Coordinates as an `(x, y, z)` tuple
    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

/// Incremental path extractor
///
/// Keeps the running position between commands so callers can feed commands
/// one at a time and tell "no motion in this command" (`Ok(None)`) apart from
/// a coordinate that failed to parse (`Err`).
#[derive(Debug, Clone, Default)]
pub struct PathExtractor {
    position: Position,
}

impl PathExtractor {
    /// Create an extractor positioned at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Current running position
    pub fn position(&self) -> Position {
        self.position
    }

    /// Process one command
    ///
    /// The position is only updated when every coordinate field parses, so a
    /// malformed command leaves the extractor where it was.
    pub fn feed(
        &mut self,
        command_index: usize,
        command: &CanonicalCommand,
    ) -> Result<Option<PathPoint>, GcodeError> {
        if !is_linear_move(command) {
            return Ok(None);
        }

        let update = coordinate_update(command_index, command)?;
        self.position.apply(&update);
        Ok(Some(PathPoint::at(self.position, command_index)))
    }
}

/// Extract the toolpath for a command list
///
/// # Errors
/// - [`GcodeError::MalformedCoordinate`] for the first coordinate field that
///   is not a finite number; extraction stops there.
/// - [`GcodeError::EmptyPath`] when no command is a linear move.
pub fn extract_path(commands: &[CanonicalCommand]) -> Result<Vec<PathPoint>, GcodeError> {
    let mut extractor = PathExtractor::new();
    let mut points = Vec::new();

    for (index, command) in commands.iter().enumerate() {
        if let Some(point) = extractor.feed(index, command)? {
            points.push(point);
        }
    }

    if points.is_empty() {
        return Err(GcodeError::EmptyPath);
    }

    tracing::debug!(
        "Extracted {} path points from {} commands",
        points.len(),
        commands.len()
    );
    Ok(points)
}

fn is_linear_move(command: &CanonicalCommand) -> bool {
    command
        .fields()
        .take_while(|field| !field.starts_with(COMMENT_MARKER))
        .any(|field| LINEAR_MOTION_TOKENS.contains(&field))
}

fn coordinate_update(
    command_index: usize,
    command: &CanonicalCommand,
) -> Result<PartialPosition, GcodeError> {
    let mut update = PartialPosition::new();

    for field in command
        .fields()
        .take_while(|field| !field.starts_with(COMMENT_MARKER))
    {
        let mut chars = field.chars();
        let axis = match chars.next() {
            Some(axis @ ('X' | 'Y' | 'Z')) => axis,
            _ => continue,
        };

        let value = chars
            .as_str()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| GcodeError::MalformedCoordinate {
                command_index,
                command: command.to_string(),
                field: field.to_string(),
            })?;

        match axis {
            'X' => update.x = Some(value),
            'Y' => update.y = Some(value),
            _ => update.z = Some(value),
        }
    }

    Ok(update)
}

/// Axis-aligned bounding box of a path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathBounds {
    /// Minimum corner
    pub min: Position,
    /// Maximum corner
    pub max: Position,
}

impl PathBounds {
    /// Compute bounds for a path, `None` when the path is empty
    pub fn of(points: &[PathPoint]) -> Option<Self> {
        let first = points.first()?.position();
        Some(points.iter().skip(1).fold(
            Self {
                min: first,
                max: first,
            },
            |bounds, point| Self {
                min: Position::new(
                    bounds.min.x.min(point.x),
                    bounds.min.y.min(point.y),
                    bounds.min.z.min(point.z),
                ),
                max: Position::new(
                    bounds.max.x.max(point.x),
                    bounds.max.y.max(point.y),
                    bounds.max.z.max(point.z),
                ),
            },
        ))
    }

    /// Extent along each axis
    pub fn size(&self) -> (f64, f64, f64) {
        (
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }
}
