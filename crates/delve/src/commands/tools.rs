//! Tools command - list the tools the research engine exposes.

use anyhow::Result;
use clap::Args;

use delve_research::builtin_definitions;

/// Arguments for the tools command.
#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// Print tool definitions as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the tools command.
pub fn run(args: ToolsArgs) -> Result<()> {
    let definitions = builtin_definitions();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    for def in &definitions {
        println!("{}", def.name);
        println!("  {}", def.description);
    }
    Ok(())
}
