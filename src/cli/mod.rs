//! # Command Line Interface
//!
//! Runs simulated invocations through the secrets middleware against one shared
//! cache, resolving secrets from environment variables, and checks configuration
//! files.

pub mod output;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Instrument};

use crate::config::{LoggingConfig, SecretsConfig};
use crate::middleware::{InvocationContext, SecretsMiddleware};
use crate::observability::{init_logging, log_secrets_config};
use crate::secrets::{CacheStats, EnvSecretProvider, SystemClock};
use output::{print_output, OutputFormat};

#[derive(Parser)]
#[command(name = "secrets-cache")]
#[command(about = "Cached secret resolution for invocation pipelines")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the configured secrets for one or more invocations
    Resolve {
        /// Configuration file (.toml, .yaml, .yml or .json)
        #[arg(short, long)]
        config: PathBuf,

        /// Number of invocations to run against the shared cache
        #[arg(short = 'n', long, default_value_t = 1)]
        invocations: u32,

        /// Pause between invocations in milliseconds
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,

        /// Print secret values instead of redacting them
        #[arg(long)]
        reveal: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Load and validate a configuration file
    Check {
        /// Configuration file (.toml, .yaml, .yml or .json)
        #[arg(short, long)]
        config: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

/// Result of one simulated invocation.
#[derive(Debug, Serialize)]
pub struct InvocationReport {
    pub invocation: u32,
    pub secrets: serde_json::Value,
    pub cache: CacheStats,
}

pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&LoggingConfig::from_env().verbose(cli.verbose))?;

    match cli.command {
        Commands::Resolve { config, invocations, interval_ms, reveal, format } => {
            let config = load_config(&config)?;
            let reports = run_invocations(
                &config,
                invocations,
                Duration::from_millis(interval_ms),
                reveal,
            )
            .await?;
            for report in &reports {
                print_output(report, format)?;
            }
        }
        Commands::Check { config, format } => {
            let config = load_config(&config)?;
            print_output(&config, format)?;
        }
    }

    Ok(())
}

/// Load a configuration file and apply `SECRETS_CACHE_*` overrides on top.
pub fn load_config(path: &std::path::Path) -> crate::Result<SecretsConfig> {
    let mut config = SecretsConfig::from_file(path)?;
    config.apply_env_overrides()?;
    config.validate()?;
    log_secrets_config(&config);
    Ok(config)
}

/// Run `invocations` sequential invocations through one middleware instance.
pub async fn run_invocations(
    config: &SecretsConfig,
    invocations: u32,
    interval: Duration,
    reveal: bool,
) -> anyhow::Result<Vec<InvocationReport>> {
    let middleware =
        SecretsMiddleware::new(config, Arc::new(EnvSecretProvider::new()), Arc::new(SystemClock))?;

    let mut reports = Vec::with_capacity(invocations as usize);
    for invocation in 1..=invocations {
        if invocation > 1 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }

        let mut ctx = InvocationContext::new();
        middleware.before(&mut ctx).instrument(crate::invocation_span!(invocation)).await?;

        let secrets = if reveal { ctx.to_exposed_json() } else { serde_json::to_value(&ctx)? };
        let cache = middleware.resolver().cache().stats();
        info!(
            invocation,
            resolved = ctx.len(),
            hits = cache.hits,
            fetches = cache.fetches,
            "Invocation complete"
        );

        reports.push(InvocationReport { invocation, secrets, cache });
    }

    Ok(reports)
}
