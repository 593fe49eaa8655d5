//! Research command - run the analyze tool on a query.

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::Args;
use serde_json::json;

use delve_research::{AnalyzeTool, ResearchConfig, ToolContext, ToolResult, default_registry};

use super::Context;

/// Arguments for the research command.
#[derive(Args, Debug)]
pub struct ResearchArgs {
    /// The research question or topic
    pub query: String,

    /// Model identifier (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum reflection rounds, 1-5 (overrides config)
    #[arg(short = 'n', long)]
    pub max_iterations: Option<u32>,

    /// Temperature for search calls, 0-1 (overrides config)
    #[arg(long)]
    pub search_temperature: Option<f32>,

    /// Temperature for reflection calls, 0-1 (overrides config)
    #[arg(long)]
    pub analysis_temperature: Option<f32>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ResearchArgs {
    /// Apply command-line overrides on top of `config`.
    fn apply(&self, mut config: ResearchConfig) -> ResearchConfig {
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(n) = self.max_iterations {
            config = config.with_max_iterations(n);
        }
        if let Some(t) = self.search_temperature {
            config = config.with_search_temperature(t);
        }
        if let Some(t) = self.analysis_temperature {
            config = config.with_analysis_temperature(t);
        }
        config
    }
}

/// Run the research command.
pub async fn run(args: ResearchArgs, ctx: &Context) -> Result<()> {
    let config = args.apply(super::research_config(&ctx.loaded.config.research()));
    config.validate()?;

    if ctx.verbose {
        eprintln!(
            "Model: {} | max iterations: {}",
            config.model, config.max_iterations
        );
    }

    let backend = super::gemini_backend(ctx, &config.model)?;
    let registry = default_registry(AnalyzeTool::new(backend, config));

    let tool_ctx = ToolContext::default();
    let token = tool_ctx.cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let result = registry
        .execute(AnalyzeTool::NAME, json!({ "query": args.query }), &tool_ctx)
        .await?;

    let report = match result {
        ToolResult::Text { content } => content,
        ToolResult::Error { message, .. } => bail!(message),
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, &report)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => println!("{}", report),
    }

    Ok(())
}
