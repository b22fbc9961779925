use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use sudoh_core::{CompilationArtifact, CompileOptions, compile_file};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Transpiles a Sudoh source file into C++ against the `sudoh.h` runtime.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Source file to compile (must end in `.sud`)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    #[arg(
        long,
        value_name = "DIR",
        default_value = "sudoh",
        help = "Directory the generated _<unit>.h / _<unit>.cpp files are written to"
    )]
    out_dir: PathBuf,

    #[arg(
        long,
        value_name = "DIR",
        help = "Directory included files are looked up in (defaults to the input's directory)"
    )]
    include_dir: Option<PathBuf>,

    #[arg(long, help = "Compile as library (do not emit the main entry point)")]
    lib: bool,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli)
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn execute(cli: Cli) -> Result<()> {
    let options = CompileOptions {
        include_root: cli.include_dir,
        emit_main: !cli.lib,
    };

    // Nothing is written unless every unit compiled.
    let artifact = compile_file(&cli.input, &options)?;
    write_artifacts(&cli.out_dir, &artifact)?;

    info!(out_dir = %cli.out_dir.display(), "wrote artifacts");
    println!("Compilation successful.");
    Ok(())
}

fn write_artifacts(out_dir: &Path, artifact: &CompilationArtifact) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create directory {}", out_dir.display()))?;
    for unit in artifact.units() {
        write_output(&out_dir.join(unit.header_file_name()), &unit.header)?;
        write_output(&out_dir.join(unit.program_file_name()), &unit.program)?;
    }
    Ok(())
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)
        .with_context(|| format!("failed to write output file {}", path.display()))
}
