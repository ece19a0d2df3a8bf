//! File utilities

pub mod file_io;

pub use file_io::{is_allowed_extension, FileReadStats, GcodeFileReader, LoadedProgram};
