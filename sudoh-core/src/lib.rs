//! Core of the Sudoh toolchain.
//!
//! Sudoh is an indentation-based pseudocode language that is transpiled
//! to C++ against the `sudoh.h` runtime. Translation is a single pass:
//!
//!   source .sud
//!     -> lexer     (tokens, newlines and leading tabs kept)
//!     -> parser    (structure, names, types and emission interleaved)
//!     -> emitter   (routine and main regions)
//!     -> compiler  (includes, headers, deferred call validation)
//!
//! The CLI and any other front end should depend on this crate rather
//! than reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod diagnostic;
pub mod error;
pub mod span;

// ---------------------------------------------------------------------
// Front-end: lexing, token navigation and indentation
// ---------------------------------------------------------------------

pub mod cursor;
pub mod lexer;
pub mod scope;

// ---------------------------------------------------------------------
// Semantic layers: names, built-ins and static types
// ---------------------------------------------------------------------

pub mod builtins;
pub mod names;
pub mod types;

// ---------------------------------------------------------------------
// Parsing, emission and compiler orchestration
// ---------------------------------------------------------------------

pub mod compiler;
pub mod emitter;
pub mod parser;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{CompilationArtifact, CompileOptions, compile_file, compile_source};
pub use diagnostic::Diagnostic;
pub use error::CoreError;
