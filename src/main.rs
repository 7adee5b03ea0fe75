//! japicc-gate CLI
//!
//! Entry point for the `japicc-gate` pipeline step.

use clap::Parser;
use japicc_gate::config::CliOverrides;
use japicc_gate::{DiskCacheStore, GateConfig, Run, RunContext, RunMode};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "japicc-gate")]
#[command(about = "Binary API compatibility gate for CI pipelines", version)]
struct Cli {
    /// Cache key prefix
    #[arg(long)]
    key: Option<String>,

    /// Glob pattern selecting artifact paths
    #[arg(long)]
    file: Option<String>,

    /// Path to repo config file (default: .japicc-gate.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Cache store root directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Explicit checker entry script (skips installation)
    #[arg(long)]
    checker: Option<PathBuf>,

    /// Directory compatibility reports are written to
    #[arg(long)]
    reports_dir: Option<PathBuf>,

    /// Verbose progress output
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        key: cli.key,
        file: cli.file,
        cache_dir: cli.cache_dir,
        checker: cli.checker,
        reports_dir: cli.reports_dir,
        verbose: cli.verbose,
    };

    let config = match GateConfig::load(cli.config.as_deref(), overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let ctx = match RunContext::from_env() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Context error: {}", e);
            process::exit(1);
        }
    };

    if config.verbose {
        eprintln!("[gate] event: {}", ctx.event.name());
    }

    let store = DiskCacheStore::new(config.cache_dir.clone());
    let run = Run::new(&ctx, &config, &store);

    match run.execute() {
        Ok(report) => {
            match report.mode {
                RunMode::Published { key } => {
                    eprintln!("[gate] baseline published under {}", key);
                }
                RunMode::Compared { results, .. } => {
                    eprintln!(
                        "[gate] comparison finished: {} file(s) checked",
                        results.len()
                    );
                }
            }
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(e.exit_code());
        }
    }
}
