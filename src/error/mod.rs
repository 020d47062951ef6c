//! Error types for document parsing and path compilation.
//!
//! Two failure surfaces exist in this crate, and each has exactly one error
//! type. [`ParseError`] is returned when XML input cannot be turned into a
//! [`Document`](crate::Document). [`PathError`] is returned when a path
//! expression cannot be compiled; path *evaluation* never fails -- a path
//! that matches nothing yields an empty result.

use std::fmt;

/// The error type returned when XML parsing fails.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Human-readable error message.
    pub message: String,
    /// 0-based byte offset in the input where the error was detected.
    pub offset: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid XML at offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ParseError {}

/// The error type returned when a path expression fails to compile.
///
/// This is the single error surfaced by the path subsystem. It is raised by
/// the tokenizer (illegal characters, malformed numbers, unterminated
/// strings) and by the parser (missing brackets or parentheses, unknown
/// function names, empty paths, misplaced tokens). The byte offset points
/// at the lexeme that could not be consumed.
#[derive(Debug, Clone)]
pub struct PathError {
    /// Human-readable error message.
    pub message: String,
    /// 0-based byte offset in the path string where the error occurred.
    pub position: usize,
}

impl PathError {
    pub(crate) fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid path at offset {}: {}",
            self.position, self.message
        )
    }
}

impl std::error::Error for PathError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError {
            message: "unexpected end of input".to_string(),
            offset: 14,
        };
        assert_eq!(
            err.to_string(),
            "invalid XML at offset 14: unexpected end of input"
        );
    }

    #[test]
    fn test_path_error_display() {
        let err = PathError::new("unterminated string", 7);
        assert_eq!(
            err.to_string(),
            "invalid path at offset 7: unterminated string"
        );
    }

    #[test]
    fn test_errors_implement_error_trait() {
        let p: &dyn std::error::Error = &ParseError {
            message: "x".to_string(),
            offset: 0,
        };
        let q: &dyn std::error::Error = &PathError::new("y", 0);
        assert!(p.source().is_none());
        assert!(q.source().is_none());
    }
}
