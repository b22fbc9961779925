//! Built-in routines provided by the Sudoh runtime.
//!
//! This module only describes the routines visible at the language level.
//! Their implementations live in the runtime library the emitted program
//! links against; every entry here is emitted as `f_<name>(...)` exactly
//! like a user-defined routine.

use core::fmt;

/// Rough grouping of the runtime routines, named in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Io,
    Conversion,
    Collection,
    Math,
}

impl fmt::Display for BuiltinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuiltinKind::Io => "I/O",
            BuiltinKind::Conversion => "conversion",
            BuiltinKind::Collection => "collection",
            BuiltinKind::Math => "math",
        })
    }
}

/// Metadata about a single builtin routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinDescriptor {
    /// Name at the Sudoh level (e.g., `printLine`).
    pub name: &'static str,
    /// Number of parameters the runtime function takes.
    pub arity: usize,
    pub kind: BuiltinKind,
}

const fn builtin(name: &'static str, arity: usize, kind: BuiltinKind) -> BuiltinDescriptor {
    BuiltinDescriptor { name, arity, kind }
}

/// The complete list of builtins known to the core.
///
/// The name manager seeds its declared-routine set from this table, so
/// calls to these never need a local declaration.
pub const BUILTINS: &[BuiltinDescriptor] = &[
    builtin("input", 0, BuiltinKind::Io),
    builtin("print", 1, BuiltinKind::Io),
    builtin("printLine", 1, BuiltinKind::Io),
    builtin("length", 1, BuiltinKind::Collection),
    builtin("string", 1, BuiltinKind::Conversion),
    builtin("integer", 1, BuiltinKind::Conversion),
    builtin("number", 1, BuiltinKind::Conversion),
    builtin("ascii", 1, BuiltinKind::Conversion),
    builtin("random", 1, BuiltinKind::Math),
    builtin("remove", 2, BuiltinKind::Collection),
    builtin("removeLast", 1, BuiltinKind::Collection),
    builtin("append", 2, BuiltinKind::Collection),
    builtin("insert", 3, BuiltinKind::Collection),
    builtin("range", 3, BuiltinKind::Collection),
    builtin("type", 1, BuiltinKind::Conversion),
    builtin("pow", 2, BuiltinKind::Math),
    builtin("cos", 1, BuiltinKind::Math),
    builtin("sin", 1, BuiltinKind::Math),
    builtin("tan", 1, BuiltinKind::Math),
    builtin("acos", 1, BuiltinKind::Math),
    builtin("asin", 1, BuiltinKind::Math),
    builtin("atan", 1, BuiltinKind::Math),
    builtin("atan2", 2, BuiltinKind::Math),
    builtin("log", 2, BuiltinKind::Math),
];

/// Look up a builtin by its Sudoh-level name.
///
/// The search is linear over `BUILTINS` because the table is small.
pub fn find_builtin(name: &str) -> Option<&'static BuiltinDescriptor> {
    BUILTINS.iter().find(|b| b.name == name)
}
