use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::span::Position;

/// Errors surfaced at the library boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read source: {0}")]
    SourceIo(#[from] std::io::Error),
    #[error("source file must have the '.sud' extension: {}", .0.display())]
    InvalidExtension(PathBuf),
    #[error("failed to read included file {}", path.display())]
    MissingInclude {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Syntax(Box<Diagnostic>),
}

/// Broad class of a fatal compilation fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Illegal character or unterminated string.
    Lexical,
    /// Indentation, empty blocks, malformed headers, misplaced keywords.
    Structural,
    /// Undeclared or duplicated variables and routines, arity mismatches.
    Name,
    /// Operator or expression type mismatches.
    Type,
}

/// The single fatal fault kind raised anywhere in the pipeline.
///
/// There is no recovery: the first `SyntaxError` aborts the unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub category: ErrorCategory,
    pub message: String,
    pub position: Position,
}

impl SyntaxError {
    pub fn new(category: ErrorCategory, message: impl Into<String>, position: Position) -> Self {
        SyntaxError {
            category,
            message: message.into(),
            position,
        }
    }

    pub fn lexical(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorCategory::Lexical, message, position)
    }

    pub fn structural(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorCategory::Structural, message, position)
    }

    pub fn name(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorCategory::Name, message, position)
    }

    pub fn type_mismatch(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorCategory::Type, message, position)
    }
}
