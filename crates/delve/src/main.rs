//! Delve - iterative web research from the command line
//!
//! Main entry point for the Delve CLI.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;

mod commands;

use commands::{config, research, tools};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Delve - iterative web research from the command line
#[derive(Parser)]
#[command(name = "delve")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration directory (default: platform config dir)
    #[arg(long, global = true, env = delve_config::CONFIG_DIR_ENV)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Research a topic and print a Markdown report
    Research(research::ResearchArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// List available tools
    Tools(tools::ToolsArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

const CRATES: [&str; 4] = ["delve", "delve_research", "delve_llm", "delve_config"];

fn directives(level: &str, fallback: &str) -> String {
    let mut parts: Vec<String> = CRATES.iter().map(|c| format!("{}={}", c, level)).collect();
    parts.push(fallback.to_string());
    parts.join(",")
}

/// Console (human-readable, stderr) + daily JSON file.
fn init_tracing(
    verbose: bool,
    logging: &delve_config::LoggingSection,
    log_dir: Option<&Path>,
) -> Option<WorkerGuard> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let console_filter = if verbose {
        directives("debug", "info")
    } else {
        directives(logging.level.as_deref().unwrap_or("info"), "warn")
    };

    let (file_layer, guard) = match log_dir.filter(|_| logging.file_enabled()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "delve.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(EnvFilter::new(directives("trace", "info")));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(EnvFilter::new(console_filter)),
        )
        .with(file_layer)
        .init();

    guard
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = cli.config_dir.clone().or_else(delve_config::user_config_dir);
    let loaded = delve_config::load_config_with_options(None, config_dir.as_deref())?;

    let logging = loaded.config.logging();
    let log_dir = logging
        .directory
        .clone()
        .or_else(|| config_dir.as_ref().map(|d| d.join("logs")));
    let _guard = init_tracing(cli.verbose, &logging, log_dir.as_deref());

    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    let ctx = commands::Context {
        loaded,
        config_dir,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Research(args) => research::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx),
        Commands::Tools(args) => tools::run(args),
    }
}
