//! Instruction parser: raw text lines to canonical commands

use super::CanonicalCommand;

/// Character that starts a whole-line comment
pub const COMMENT_MARKER: char = ';';

/// Parse raw lines into canonical commands
///
/// Blank lines and lines whose first non-whitespace character is
/// [`COMMENT_MARKER`] are dropped. Everything else is trimmed and kept in
/// source order; instruction syntax is not validated.
pub fn parse_lines<I>(lines: I) -> Vec<CanonicalCommand>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| CanonicalCommand::from_line(line.as_ref()))
        .collect()
}

/// Parse a whole program text into canonical commands
pub fn parse_str(text: &str) -> Vec<CanonicalCommand> {
    parse_lines(text.lines())
}
