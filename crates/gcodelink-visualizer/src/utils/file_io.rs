//! G-code file reading
//!
//! Reads instruction files line by line (lossy UTF-8, so a stray byte in a
//! slicer comment does not reject the whole file) and hands the lines to the
//! instruction parser.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use gcodelink_core::{AppEvent, FileEvent, GcodeError, Result};

use crate::gcode::{parse_lines, CanonicalCommand};

/// Buffer size for reading large files (256 KB)
const READ_BUFFER_SIZE: usize = 256 * 1024;

/// File read statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReadStats {
    /// Total bytes read
    pub bytes_read: u64,
    /// Total lines read, including blank and comment lines
    pub lines_read: u64,
    /// Lines that contained invalid UTF-8 and were decoded lossily
    pub lossy_lines: u64,
    /// File size in bytes
    pub file_size: u64,
    /// Time taken to read (milliseconds)
    pub read_time_ms: u64,
}

/// A parsed program and the statistics of the read that produced it
#[derive(Debug, Clone)]
pub struct LoadedProgram {
    /// Canonical commands in file order
    pub commands: Vec<CanonicalCommand>,
    /// Read statistics
    pub stats: FileReadStats,
}

/// G-code file reader
pub struct GcodeFileReader {
    path: PathBuf,
    file_size: u64,
}

impl GcodeFileReader {
    /// Create a new G-code file reader
    ///
    /// # Errors
    /// Returns [`GcodeError::FileError`] if the path does not exist or is not
    /// a regular file.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.is_file() {
            return Err(GcodeError::FileError {
                reason: format!("Not a readable file: {}", path.display()),
            }
            .into());
        }

        let file_size = fs::metadata(&path)?.len();
        Ok(Self { path, file_size })
    }

    /// Get file size in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file line by line
    ///
    /// Line terminators are stripped before `callback` sees the line.
    pub fn read_lines<F>(&self, mut callback: F) -> Result<FileReadStats>
    where
        F: FnMut(&str),
    {
        let start = Instant::now();
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, File::open(&self.path)?);
        let mut stats = FileReadStats {
            file_size: self.file_size,
            ..Default::default()
        };
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            stats.bytes_read += n as u64;
            stats.lines_read += 1;

            let line = String::from_utf8_lossy(&buf);
            if matches!(line, std::borrow::Cow::Owned(_)) {
                stats.lossy_lines += 1;
            }
            callback(line.trim_end_matches(['\r', '\n']));
        }

        stats.read_time_ms = start.elapsed().as_millis() as u64;
        if stats.lossy_lines > 0 {
            tracing::warn!(
                "{}: {} lines contained invalid UTF-8",
                self.path.display(),
                stats.lossy_lines
            );
        }
        Ok(stats)
    }

    /// Read and parse the whole file into canonical commands
    pub fn load(&self) -> Result<LoadedProgram> {
        let mut lines = Vec::new();
        let stats = self.read_lines(|line| lines.push(line.to_string()))?;
        let commands = parse_lines(&lines);

        tracing::info!(
            "Loaded {} commands from {} ({} lines)",
            commands.len(),
            self.path.display(),
            stats.lines_read
        );
        gcodelink_core::emit!(AppEvent::File(FileEvent::Loaded {
            path: self.path.clone(),
            commands: commands.len(),
        }));

        Ok(LoadedProgram { commands, stats })
    }
}

/// Check a file name against a list of allowed extensions
///
/// The comparison ignores case and a leading dot in the allowed entries.
pub fn is_allowed_extension(path: impl AsRef<Path>, allowed: &[String]) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            allowed
                .iter()
                .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["gcode".to_string(), ".txt".to_string()]
    }

    #[test]
    fn test_allowed_extension() {
        assert!(is_allowed_extension("part.gcode", &allowed()));
        assert!(is_allowed_extension("PART.GCODE", &allowed()));
        assert!(is_allowed_extension("notes.txt", &allowed()));
        assert!(!is_allowed_extension("model.stl", &allowed()));
        assert!(!is_allowed_extension("gcode", &allowed()));
    }

    #[test]
    fn test_missing_file() {
        let result = GcodeFileReader::new("/definitely/not/here.gcode");
        assert!(matches!(
            result,
            Err(gcodelink_core::Error::Gcode(GcodeError::FileError { .. }))
        ));
    }
}
