//! Config command - configuration management.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show resolved configuration, key source and warnings
    Show,

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Path => cmd_path(ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;

    println!("# Delve Configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    let research = super::research_config(&loaded.config.research());
    println!("Research:");
    println!("  {:<22} {}", "model", research.model);
    println!("  {:<22} {}", "search_temperature", research.search_temperature);
    println!("  {:<22} {}", "analysis_temperature", research.analysis_temperature);
    println!("  {:<22} {}", "max_iterations", research.max_iterations);
    println!();

    let gemini = loaded.config.gemini();
    let key_status = match delve_config::resolve_api_key(gemini.api_key.as_deref()) {
        Some(secret) => format!("set ({})", secret.source),
        None => format!("not set (export {})", delve_config::API_KEY_ENV),
    };
    println!("Gemini:");
    println!(
        "  {:<22} {}",
        "base_url",
        gemini.base_url.as_deref().unwrap_or("(default)")
    );
    println!("  {:<22} {}", "api_key", key_status);
    println!();

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for warning in &loaded.warnings {
            println!("  - {}", warning);
        }
    }

    Ok(())
}

fn cmd_path(ctx: &Context) -> Result<()> {
    match &ctx.config_dir {
        Some(dir) => println!("{}", dir.join("config.toml").display()),
        None => println!("No configuration directory available on this platform"),
    }
    Ok(())
}
