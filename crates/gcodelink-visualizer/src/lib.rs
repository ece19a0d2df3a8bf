//! # gcodelink Visualizer
//!
//! G-code parsing and toolpath extraction for gcodelink.
//! Turns raw instruction text into canonical commands and walks linear moves
//! into the ordered point list an external plotter draws.

pub mod gcode;
pub mod utils;
pub mod visualizer;

pub use gcode::{parse_lines, parse_str, CanonicalCommand, COMMENT_MARKER};

pub use visualizer::{extract_path, PathBounds, PathExtractor, PathPoint};

pub use utils::{is_allowed_extension, FileReadStats, GcodeFileReader, LoadedProgram};
