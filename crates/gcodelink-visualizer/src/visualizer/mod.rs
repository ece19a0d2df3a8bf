//! Toolpath geometry for visualization
//!
//! The engine only produces coordinates; drawing them is left to an external
//! plotter, which receives the points (optionally as JSON via `serde`).

pub mod path;

pub use path::{extract_path, PathBounds, PathExtractor, PathPoint};
