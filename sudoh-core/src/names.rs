//! Name bookkeeping for one compilation unit.
//!
//! Tracks variables per lexical frame, the declared routine signatures
//! (built-ins, imports and local definitions) and every call site. Calls
//! are validated only once the whole file has been parsed, because a
//! routine may be called above its declaration.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::builtins::{BUILTINS, BuiltinKind, find_builtin};
use crate::error::SyntaxError;
use crate::span::Position;

/// Words that can never be used as variable or routine names.
pub const KEYWORDS: &[&str] = &[
    "if", "then", "else", "do", "not", "true", "false", "null", "repeat", "while", "until", "for",
    "each", "in", "to", "down", "return", "break", "continue", "mod", "function", "and", "or",
    "including",
];

/// `[_a-zA-Z][_a-zA-Z0-9]*`
pub fn is_identifier(text: &str) -> bool {
    let mut bytes = text.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() || first == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// An identifier that is not a keyword.
pub fn is_valid_name(text: &str) -> bool {
    is_identifier(text) && !KEYWORDS.contains(&text)
}

/// A routine's identity: name plus parameter count.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoutineSignature {
    pub name: String,
    pub arity: usize,
}

impl RoutineSignature {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        RoutineSignature {
            name: name.into(),
            arity,
        }
    }
}

/// A call site, kept until end-of-file validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineCall {
    pub signature: RoutineSignature,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("cannot declare '{0}' more than once for the same block")]
    DuplicateBinding(String),
    #[error("function named '{name}' taking {arity} parameter(s) has already been defined")]
    DuplicateRoutine { name: String, arity: usize },
    #[error("function named '{name}' taking {arity} parameter(s) is a built-in {kind} routine")]
    BuiltinRoutine {
        name: String,
        arity: usize,
        kind: BuiltinKind,
    },
}

/// Names that must become visible in one specific, not yet opened block.
///
/// Produced while parsing a structure header (routine parameters, loop
/// variables) and handed to the block parse that follows it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingBindings {
    target_level: usize,
    names: Vec<String>,
}

impl PendingBindings {
    pub fn for_level(target_level: usize) -> Self {
        PendingBindings {
            target_level,
            names: Vec::new(),
        }
    }

    pub fn schedule(&mut self, name: &str) -> Result<(), NameError> {
        if self.names.iter().any(|n| n == name) {
            return Err(NameError::DuplicateBinding(name.to_string()));
        }
        self.names.push(name.to_string());
        Ok(())
    }
}

#[derive(Debug)]
pub struct NameManager {
    /// Frame `i` holds the variables declared at scope level `i`.
    frames: Vec<HashSet<String>>,
    /// Declared arities by routine name.
    declared: BTreeMap<String, BTreeSet<usize>>,
    /// Routines defined in this unit, in declaration order.
    defined: Vec<RoutineSignature>,
    calls: Vec<RoutineCall>,
}

impl Default for NameManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NameManager {
    pub fn new() -> Self {
        let mut declared: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
        for builtin in BUILTINS {
            declared
                .entry(builtin.name.to_string())
                .or_default()
                .insert(builtin.arity);
        }
        NameManager {
            frames: Vec::new(),
            declared,
            defined: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Whether `name` is declared in any frame from `floor` to the top.
    pub fn variable_exists(&self, name: &str, floor: usize) -> bool {
        self.frames
            .iter()
            .skip(floor)
            .any(|frame| frame.contains(name))
    }

    /// Declares `name` in the innermost frame.
    pub fn declare_variable(&mut self, name: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string());
        }
    }

    /// Pushes a frame and merges `bindings` into it when they target the
    /// level being opened.
    pub fn enter_scope(&mut self, bindings: PendingBindings) {
        let level = self.frames.len();
        let mut frame = HashSet::new();
        if bindings.target_level == level {
            frame.extend(bindings.names);
        } else {
            debug_assert!(
                bindings.names.is_empty(),
                "bindings for level {} dropped at level {level}",
                bindings.target_level
            );
        }
        self.frames.push(frame);
    }

    pub fn exit_scope(&mut self) {
        self.frames.pop();
    }

    /// Records a routine defined in this unit.
    pub fn register_declaration(&mut self, signature: RoutineSignature) -> Result<(), NameError> {
        self.insert_declared(&signature)?;
        debug!(name = %signature.name, arity = signature.arity, "declared routine");
        self.defined.push(signature);
        Ok(())
    }

    /// Makes routines defined by an included unit callable here.
    pub fn import_routines(&mut self, signatures: &[RoutineSignature]) -> Result<(), NameError> {
        for signature in signatures {
            self.insert_declared(signature)?;
        }
        Ok(())
    }

    fn insert_declared(&mut self, signature: &RoutineSignature) -> Result<(), NameError> {
        let arities = self.declared.entry(signature.name.clone()).or_default();
        if arities.contains(&signature.arity) {
            let name = signature.name.clone();
            let arity = signature.arity;
            return Err(match find_builtin(&name) {
                Some(builtin) if builtin.arity == arity => NameError::BuiltinRoutine {
                    name,
                    arity,
                    kind: builtin.kind,
                },
                _ => NameError::DuplicateRoutine { name, arity },
            });
        }
        arities.insert(signature.arity);
        Ok(())
    }

    /// Records a call site without checking it.
    pub fn record_call(&mut self, name: &str, arity: usize, position: Position) {
        self.calls.push(RoutineCall {
            signature: RoutineSignature::new(name, arity),
            position,
        });
    }

    /// Checks every recorded call against the declared routines, in call
    /// order, failing on the first mismatch.
    pub fn validate_all_calls(&self) -> Result<(), SyntaxError> {
        for call in &self.calls {
            let RoutineSignature { name, arity } = &call.signature;
            let Some(arities) = self.declared.get(name) else {
                return Err(SyntaxError::name(
                    format!(
                        "attempted use of undeclared function '{name}' accepting {arity} parameter(s)"
                    ),
                    call.position,
                ));
            };
            if !arities.contains(arity) {
                let expected = arities
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join(" or ");
                return Err(SyntaxError::name(
                    format!(
                        "function '{name}' expects {expected} parameter(s) but was called with {arity}"
                    ),
                    call.position,
                ));
            }
        }
        debug!(calls = self.calls.len(), "validated routine calls");
        Ok(())
    }

    /// Routines defined in this unit, in declaration order.
    pub fn defined_routines(&self) -> &[RoutineSignature] {
        &self.defined
    }
}
