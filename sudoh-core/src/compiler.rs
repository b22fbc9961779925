//! Compilation driver.
//!
//! Every unit (the entry file and each file it includes) is compiled by
//! its own [`Parser`]; the only thing shared between units is the list of
//! routines an included unit defines.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, info_span};

use crate::diagnostic::Diagnostic;
use crate::error::{CoreError, SyntaxError};
use crate::lexer::tokenize;
use crate::names::RoutineSignature;
use crate::parser::Parser;

/// Extension every Sudoh source file must carry.
pub const SOURCE_EXTENSION: &str = "sud";

/// Runtime header every generated header depends on.
const RUNTIME_HEADER: &str = "sudoh.h";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Directory included units are looked up in. `None` means the entry
    /// file's directory (or the working directory for in-memory sources).
    pub include_root: Option<PathBuf>,
    /// Emit the `int main()` region. Off for library units.
    pub emit_main: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            include_root: None,
            emit_main: true,
        }
    }
}

/// Generated code for one unit plus, recursively, the units it includes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationArtifact {
    pub unit: String,
    /// Forward declarations of the routines defined in this unit.
    pub header: String,
    pub program: String,
    pub routines: Vec<RoutineSignature>,
    pub included: Vec<CompilationArtifact>,
}

impl CompilationArtifact {
    pub fn header_file_name(&self) -> String {
        format!("_{}.h", self.unit)
    }

    pub fn program_file_name(&self) -> String {
        format!("_{}.cpp", self.unit)
    }

    /// This unit and every unit it transitively includes, each once,
    /// depth first.
    pub fn units(&self) -> Vec<&CompilationArtifact> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        self.collect_units(&mut seen, &mut out);
        out
    }

    fn collect_units<'a>(
        &'a self,
        seen: &mut BTreeSet<&'a str>,
        out: &mut Vec<&'a CompilationArtifact>,
    ) {
        if !seen.insert(self.unit.as_str()) {
            return;
        }
        out.push(self);
        for child in &self.included {
            child.collect_units(seen, out);
        }
    }
}

/// Compiles in-memory source as unit `unit`.
pub fn compile_source(
    unit: &str,
    source: &str,
    options: &CompileOptions,
) -> Result<CompilationArtifact, CoreError> {
    let include_root = options
        .include_root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    Compiler::new(include_root).compile_unit(unit, source, options.emit_main)
}

/// Compiles a `.sud` file. The unit name is the file stem.
pub fn compile_file(
    path: impl AsRef<Path>,
    options: &CompileOptions,
) -> Result<CompilationArtifact, CoreError> {
    let path = path.as_ref();
    let unit = match (path.extension(), path.file_stem()) {
        (Some(ext), Some(stem)) if ext == SOURCE_EXTENSION => stem.to_string_lossy().into_owned(),
        _ => return Err(CoreError::InvalidExtension(path.to_path_buf())),
    };
    let source = fs::read_to_string(path)?;

    let include_root = match &options.include_root {
        Some(root) => root.clone(),
        None => path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    Compiler::new(include_root).compile_unit(&unit, &source, options.emit_main)
}

struct Compiler {
    include_root: PathBuf,
    /// Units currently being compiled, outermost first.
    active_units: Vec<String>,
}

impl Compiler {
    fn new(include_root: PathBuf) -> Self {
        Compiler {
            include_root,
            active_units: Vec::new(),
        }
    }

    fn compile_unit(
        &mut self,
        unit: &str,
        source: &str,
        emit_main: bool,
    ) -> Result<CompilationArtifact, CoreError> {
        let span = info_span!("compile_unit", unit);
        let _enter = span.enter();

        self.active_units.push(unit.to_string());
        let result = self.compile_active_unit(unit, source, emit_main);
        self.active_units.pop();
        result
    }

    fn compile_active_unit(
        &mut self,
        unit: &str,
        source: &str,
        emit_main: bool,
    ) -> Result<CompilationArtifact, CoreError> {
        let syntax = |error: SyntaxError| {
            CoreError::Syntax(Box::new(Diagnostic::from_error(unit, source, &error)))
        };

        let tokens = tokenize(source).map_err(syntax)?;
        debug!(tokens = tokens.len(), "tokenized");

        let mut parser = Parser::new(tokens);
        parser.begin().map_err(syntax)?;
        parser.add_include(unit);

        let mut included = Vec::new();
        for request in parser.parse_include_list().map_err(syntax)? {
            if self.active_units.contains(&request.name) {
                return Err(syntax(SyntaxError::structural(
                    format!("circular include of '{}'", request.name),
                    request.position,
                )));
            }

            let path = self
                .include_root
                .join(format!("{}.{SOURCE_EXTENSION}", request.name));
            debug!(path = %path.display(), at = %request.position, "resolving include");
            let included_source =
                fs::read_to_string(&path).map_err(|source| CoreError::MissingInclude {
                    path: path.clone(),
                    source,
                })?;

            let artifact = self.compile_unit(&request.name, &included_source, false)?;
            parser
                .import_routines(&artifact.routines, request.position)
                .map_err(syntax)?;
            parser.add_include(&request.name);
            included.push(artifact);
        }

        parser.parse_program().map_err(syntax)?;

        let routines = parser.defined_routines().to_vec();
        info!(
            routines = routines.len(),
            includes = included.len(),
            "compiled unit"
        );
        Ok(CompilationArtifact {
            unit: unit.to_string(),
            header: render_header(&routines),
            program: parser.finish(emit_main),
            routines,
            included,
        })
    }
}

fn render_header(routines: &[RoutineSignature]) -> String {
    let mut header = format!("#pragma once\n#include \"{RUNTIME_HEADER}\"\n\n");
    for routine in routines {
        let params = vec!["var"; routine.arity].join(", ");
        header.push_str(&format!("var f_{}({params});\n", routine.name));
    }
    header
}
