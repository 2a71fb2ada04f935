//! TextGlass command line client
//!
//! Loads a domain from pattern, patch and attribute documents, runs test
//! documents against it and classifies a single input string.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use textglass_classifiers::{Document, Domain, DomainBuilder};
use tracing::{debug, info, warn};

mod config;
mod harness;

use config::RunConfig;
use harness::{format_duration, run_test_document};

#[derive(Parser, Debug)]
#[command(name = "textglass")]
#[command(about = "TextGlass domain classifier client", version, long_about = None)]
pub(crate) struct Cli {
    /// Run configuration file (YAML)
    #[arg(short, long, env = "TEXTGLASS_CONFIG")]
    config: Option<PathBuf>,

    /// Pattern document
    #[arg(short, long)]
    pattern: Option<PathBuf>,

    /// Pattern patch document
    #[arg(long = "pattern-patch", visible_alias = "pp")]
    pattern_patch: Option<PathBuf>,

    /// Attribute document
    #[arg(short, long)]
    attribute: Option<PathBuf>,

    /// Attribute patch document
    #[arg(long = "attribute-patch", visible_alias = "ap")]
    attribute_patch: Option<PathBuf>,

    /// Test document, may be repeated
    #[arg(short, long)]
    test: Vec<PathBuf>,

    /// Warmup iterations before timing
    #[arg(short, long)]
    warmup: Option<u32>,

    /// Only print results and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Increase logging, repeat for trace output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// String to classify
    input: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.quiet, cli.verbose);

    info!("TextGlass client {}", env!("CARGO_PKG_VERSION"));

    let config = RunConfig::load(cli.config.as_deref(), &cli)?;

    if let Some(iterations) = config.warmup {
        run_warmup(&config, iterations)?;
    }

    let start = Instant::now();
    let domain = load_domain(&config)?;
    info!("Domain load time: {}", format_duration(start.elapsed()));

    let mut failure = false;

    for path in &config.tests {
        info!("Test file: '{}'", path.display());
        let doc = load_document(path)?;
        let report = run_test_document(&domain, &doc)?;

        if !report.is_pass() {
            warn!(
                "{}: {} of {} test(s) failed",
                report.identity,
                report.total - report.passed,
                report.total
            );
            failure = true;
        }
    }

    if let Some(input) = &cli.input {
        info!("Test string: '{}'", input);

        let start = Instant::now();
        let result = domain.classify(input)?;
        let elapsed = start.elapsed();

        println!("{}", serde_json::to_string(&result)?);
        info!("Test time: {}", format_duration(elapsed));
    }

    if failure {
        anyhow::bail!("One or more tests failed");
    }

    Ok(())
}

/// Load every configured document and build the domain
fn load_domain(config: &RunConfig) -> Result<Domain> {
    let pattern_path = config
        .pattern
        .as_deref()
        .context("Pattern file required")?;

    info!("Pattern file: '{}'", pattern_path.display());
    let pattern = load_document(pattern_path)?;

    let pattern_patch = load_optional("Pattern patch", config.pattern_patch.as_deref())?;
    let attribute = load_optional("Attribute", config.attribute.as_deref())?;
    let attribute_patch = load_optional("Attribute patch", config.attribute_patch.as_deref())?;

    let domain = DomainBuilder::load(
        &pattern,
        pattern_patch.as_ref(),
        attribute.as_ref(),
        attribute_patch.as_ref(),
    )?;

    Ok(domain)
}

fn load_optional(label: &str, path: Option<&Path>) -> Result<Option<Document>> {
    path.map(|path| {
        info!("{} file: '{}'", label, path.display());
        load_document(path)
    })
    .transpose()
}

fn load_document(path: &Path) -> Result<Document> {
    Document::from_file(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Repeat the full load and test cycle to warm caches before timing
fn run_warmup(config: &RunConfig, iterations: u32) -> Result<()> {
    info!("Warmup {} iteration(s)...", iterations);

    for iteration in 0..iterations {
        debug!("Warmup iteration {}", iteration + 1);
        let domain = load_domain(config)?;

        for path in &config.tests {
            run_test_document(&domain, &load_document(path)?)?;
        }
    }

    info!("Warmup completed");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(quiet: bool, verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };

    let filter = if quiet || verbose > 0 {
        EnvFilter::new(format!("textglass_classifiers={level},textglass={level}"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("textglass_classifiers={level},textglass={level}"))
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).without_time())
        .init();
}
