//! Canonical G-Code command type

use serde::{Deserialize, Serialize};
use std::fmt;

use super::parser::COMMENT_MARKER;

/// One device instruction, trimmed, with no blank or comment content
///
/// The text is fixed once constructed; the only way to get a different
/// command is to parse again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalCommand {
    text: String,
}

impl CanonicalCommand {
    /// Filter a single raw line
    ///
    /// Returns `None` when the trimmed line is empty or starts with the
    /// comment marker. Otherwise the trimmed text is kept verbatim.
    pub fn from_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_MARKER) {
            return None;
        }
        Some(Self {
            text: trimmed.to_string(),
        })
    }

    /// Command text as sent on the wire (without terminator)
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whitespace-separated fields of the command
    pub fn fields(&self) -> std::str::SplitWhitespace<'_> {
        self.text.split_whitespace()
    }

    /// Length of the command in bytes, excluding the line terminator
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Always false: canonical commands are never blank
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl AsRef<str> for CanonicalCommand {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for CanonicalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq<str> for CanonicalCommand {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for CanonicalCommand {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}
