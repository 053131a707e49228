use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use permitted_contents::{
    FsSourceConfig, ValidationConfig, load_rules_file, load_spec_file, output, validate_fs,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "permitted-contents",
    version,
    about = "Check HTML element children against permitted-content grammars"
)]
pub struct Cli {
    /// Spec repository (JSON or YAML): categories and per-tag content models
    #[arg(long, value_name = "FILE")]
    pub spec: PathBuf,

    /// User content rules (JSON or YAML), checked in addition to the spec
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Glob pattern of files to skip (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Validate elements on all cores
    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    /// Maximum size of a single document file in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_file_size: Option<u64>,

    /// Follow symbolic links while scanning
    #[arg(long, default_value_t = false)]
    pub follow_links: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); `RUST_LOG` takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Document files or directories to validate
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

impl Cli {
    fn fs_config(&self) -> FsSourceConfig {
        let mut config = FsSourceConfig::default()
            .with_paths(self.paths.clone())
            .with_exclude(self.exclude.clone());
        if let Some(max) = self.max_file_size {
            config.max_file_size = max;
        }
        config.follow_links = self.follow_links;
        config
    }
}

/// Parse the process arguments, validate, and print the report to stdout.
///
/// Returns whether validation passed.
///
/// # Errors
///
/// Returns an error if the spec or rules cannot be loaded, if a path is
/// missing, or if the report cannot be written.
pub fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli, &mut out)
}

/// Run one validation described by `cli`, writing the report to `out`.
///
/// # Errors
///
/// Returns an error if the spec or rules cannot be loaded, if a path is
/// missing, or if the report cannot be written.
pub fn execute(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<bool> {
    let repo = load_spec_file(&cli.spec)
        .with_context(|| format!("Failed to load spec {}", cli.spec.display()))?;
    let rules = match &cli.rules {
        Some(path) => load_rules_file(path)
            .with_context(|| format!("Failed to load rules {}", path.display()))?,
        None => Vec::new(),
    };
    debug!(rules = rules.len(), parallel = cli.parallel, "configuration loaded");

    let config = ValidationConfig::default()
        .with_rules(rules)
        .with_parallel(cli.parallel);
    let report = validate_fs(&cli.fs_config(), &repo, &config)?;

    match cli.format {
        OutputFormat::Human => output::write_human_fs(&report, out)?,
        OutputFormat::Json => output::write_json(&report, out)?,
    }
    info!(ok = report.ok, "done");
    Ok(report.ok)
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Logs go to stderr so stdout carries only the report.
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        debug!("tracing subscriber already installed");
    }
}
