//! Run command implementation

use anyhow::Result;

use super::adjust::run_adjustments;
use super::ingest::ingest_sources;
use super::lag::run_analyses;
use super::screen::run_screens;
use crate::cli::{GlobalArgs, OutputFormat, RunArgs};
use crate::context::RuntimeContext;

/// Execute the full pipeline against one store connection: ingest, adjust,
/// lag, screen. Any failing stage stops the run.
pub(crate) async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;

    println!("== ingest ==\n");
    ingest_sources(&ctx, None).await?;

    println!("\n== adjust ==\n");
    run_adjustments(&ctx, None).await?;

    println!("\n== lag ==\n");
    run_analyses(&ctx, None, args.lag, OutputFormat::Table).await?;

    println!("== screen ==\n");
    run_screens(&ctx, None, OutputFormat::Table).await?;

    Ok(())
}
