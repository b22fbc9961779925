//! User-facing rendering of a fatal fault.
//!
//! A `Diagnostic` is a `SyntaxError` resolved against the source text it
//! came from: the offending line is cut out of the source and a caret is
//! placed under the exact character the fault points at.

use core::fmt;

use crate::error::{ErrorCategory, SyntaxError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Unit name (file stem) the fault was found in.
    pub unit: String,
    pub category: ErrorCategory,
    pub message: String,
    pub line: usize,
    /// Column of the caret, counted in characters from the start of
    /// `source_line`.
    pub column: usize,
    /// The offending line with its leading indentation removed.
    pub source_line: String,
}

impl Diagnostic {
    pub fn from_error(unit: &str, source: &str, error: &SyntaxError) -> Self {
        let bytes = source.as_bytes();
        let offset = error.position.offset.min(source.len());

        let mut begin = offset;
        while begin > 0 && bytes[begin - 1] != b'\n' && bytes[begin - 1] != b'\t' {
            begin -= 1;
        }
        let mut end = offset;
        while end < bytes.len() && bytes[end] != b'\n' {
            end += 1;
        }

        let source_line = source[begin..end].trim_end_matches('\r').to_string();
        let column = source[begin..offset].chars().count();

        Diagnostic {
            unit: unit.to_string(),
            category: error.category,
            message: error.message.clone(),
            line: error.position.line,
            column,
            source_line,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Syntax error on line {} of file '{}.sud': {}",
            self.line, self.unit, self.message
        )?;
        writeln!(f, "\t{}", self.source_line)?;
        write!(f, "\t{}^", " ".repeat(self.column))
    }
}
