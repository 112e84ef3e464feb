//! `loom` — compiles a `.loom` source file and generates its dataset.
//!
//! This binary is intentionally thin: it owns the only `tracing` subscriber
//! in the process, the only `anyhow`-wrapped error boundary, and all file
//! I/O. Everything else — parsing, generation, validation — lives in the
//! library and never touches a filesystem or a logger directly.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use loom_dsl::config::Config;
use loom_dsl::dataset::{Generator, GenerationOutcome};
use loom_dsl::plugin::PluginRegistry;
use loom_dsl::compile_with;

/// Compile a Loom source file and generate its dataset.
#[derive(Debug, Parser)]
#[command(name = "loom", version, about)]
struct Cli {
    /// Path to a `.loom` source file.
    source: PathBuf,

    /// Seed overriding the one from configuration.
    #[arg(long)]
    seed: Option<u64>,

    /// Path to a config file (defaults to `loom.toml` discovery).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Elevate specific constraint failures (unique-pool exhaustion,
    /// constraint-retry exhaustion, a missing contract, an unknown
    /// generator) from a drained warning to a fatal generation error.
    /// Does not fail the process merely because some warning was emitted.
    #[arg(long)]
    strict: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(&path.to_string_lossy()),
        None => Config::load(),
    }
    .unwrap_or_default();

    init_tracing(&config.logging.level);

    match run(&cli, config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: Config) -> anyhow::Result<ExitCode> {
    let source = fs::read_to_string(&cli.source)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", cli.source.display()))?;

    let (configured_seed, mut options, retry_limits) = config.into_parts();
    if cli.strict {
        options.strict = true;
    }
    let seed = cli.seed.unwrap_or(configured_seed);

    let program = compile_with(&source, &PluginRegistry::new())?;
    let mut outcome =
        Generator::generate_with_retry_limits(&program, seed, PluginRegistry::new(), options, retry_limits)?;

    if let Some(fatal) = &outcome.error {
        eprintln!("error: {fatal}");
        print_collections(&outcome)?;
        return Ok(ExitCode::FAILURE);
    }

    print_collections(&outcome)?;

    for warning in outcome.warnings.drain(..) {
        eprintln!("warning[{:?}]: {}", warning.kind, warning.message);
    }
    for failure in &outcome.validation.failures {
        eprintln!("validation failed: {} ({})", failure.predicate, failure.reason);
    }

    if !outcome.validation.is_valid() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_collections(outcome: &GenerationOutcome) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&outcome.collections)?;
    println!("{json}");
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
