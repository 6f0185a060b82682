//! Ingest command implementation

use anyhow::{Context, Result};
use fb_core::{reshape, SourceFile};
use fb_db::SeriesRows;

use super::common::{exit_code_for, select_by_name, ExitCode};
use crate::cli::{GlobalArgs, IngestArgs};
use crate::context::RuntimeContext;

/// Execute the ingest command
pub(crate) async fn execute(args: &IngestArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    ingest_sources(&ctx, args.sources.as_deref()).await
}

/// Load, clean and reshape the selected source files, replacing one stored
/// series per file.
pub(crate) async fn ingest_sources(ctx: &RuntimeContext, filter: Option<&str>) -> Result<()> {
    let sources = select_by_name(&ctx.project.sources, filter, "source", |s| s.name.as_str())?;

    if sources.is_empty() {
        println!("No source files found in source_paths.");
        return Ok(());
    }

    ctx.verbose(&format!(
        "Ingesting {} sources from paths: {:?}",
        sources.len(),
        ctx.project.config.source_paths
    ));
    println!(
        "Ingesting {} sources (years {})...\n",
        sources.len(),
        ctx.project.config.years
    );

    let mut success_count = 0;
    let mut total_rows = 0;
    let mut exit_code = None;

    for source in sources {
        match ingest_one(ctx, source).await {
            Ok((rows, entities)) => {
                success_count += 1;
                total_rows += rows;
                println!("  ✓ {} ({} rows, {} entities)", source.name, rows, entities);
            }
            Err(e) => {
                println!("  ✗ {} - {:#}", source.name, e);
                exit_code = exit_code.max(Some(exit_code_for(&e)));
            }
        }
    }

    println!();
    println!(
        "Ingested {} sources ({} total rows)",
        success_count, total_rows
    );

    match exit_code {
        Some(code) => Err(ExitCode(code).into()),
        None => Ok(()),
    }
}

async fn ingest_one(ctx: &RuntimeContext, source: &SourceFile) -> Result<(usize, usize)> {
    let table = ctx.store.load_wide_csv(&source.path).await?;
    let series = reshape(&table, source.name.clone(), ctx.project.config.years)
        .with_context(|| format!("Failed to reshape {}", source.path.display()))?;
    let rows = ctx
        .store
        .replace_series(&source.name, SeriesRows::Long(&series))
        .await?;
    log::info!("ingested {} into {} ({} rows)", source.path.display(), source.name, rows);
    Ok((rows, series.entities().len()))
}
