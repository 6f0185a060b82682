//! Adjust command implementation

use anyhow::{Context, Result};
use fb_core::config::AdjustmentConfig;
use fb_db::SeriesRows;

use super::common::{exit_code_for, format_number, select_by_name, ExitCode};
use crate::cli::{AdjustArgs, GlobalArgs};
use crate::context::RuntimeContext;

/// Execute the adjust command
pub(crate) async fn execute(args: &AdjustArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    run_adjustments(&ctx, args.adjustments.as_deref()).await
}

/// Apply the selected adjustments in configuration order.
///
/// The first failure stops the run: an adjustment that cannot be computed
/// for every record writes nothing, and later adjustments are not attempted.
pub(crate) async fn run_adjustments(ctx: &RuntimeContext, filter: Option<&str>) -> Result<()> {
    let adjustments = select_by_name(
        &ctx.project.config.adjustments,
        filter,
        "adjustment",
        |a| a.name.as_str(),
    )?;

    if adjustments.is_empty() {
        println!("No adjustments configured.");
        return Ok(());
    }

    println!("Applying {} adjustments...\n", adjustments.len());

    for adjustment in &adjustments {
        match apply(ctx, adjustment).await {
            Ok(summary) => println!("  ✓ {} {}", adjustment.name, summary),
            Err(e) => {
                println!("  ✗ {} - {:#}", adjustment.name, e);
                return Err(ExitCode(exit_code_for(&e)).into());
            }
        }
    }

    println!();
    println!("Applied {} adjustments", adjustments.len());
    Ok(())
}

async fn apply(ctx: &RuntimeContext, adjustment: &AdjustmentConfig) -> Result<String> {
    let table = ctx.project.config.inflation_table(&adjustment.table)?;
    let series = ctx.read_series(&adjustment.series).await?;

    let adjusted = fb_core::adjust(
        &series,
        &table.index,
        table.convention,
        adjustment.output.clone(),
    )
    .with_context(|| {
        format!(
            "Adjustment '{}' with table '{}' failed",
            adjustment.name, adjustment.table
        )
    })?;

    let rows = ctx
        .store
        .replace_series(&adjustment.output, SeriesRows::Adjusted(&adjusted))
        .await?;

    let factors = adjusted
        .records
        .iter()
        .map(|r| r.index_factor)
        .fold(None, |acc: Option<(f64, f64)>, f| match acc {
            None => Some((f, f)),
            Some((lo, hi)) => Some((lo.min(f), hi.max(f))),
        });
    let factor_range = factors
        .map(|(lo, hi)| format!(", factors {:.4}..{:.4}", lo, hi))
        .unwrap_or_default();

    ctx.verbose(&format!(
        "{} -> {} using {} ({}), first value {}",
        adjustment.series,
        adjustment.output,
        adjustment.table,
        table.convention,
        adjusted
            .records
            .first()
            .and_then(|r| r.adjusted_value)
            .map(format_number)
            .unwrap_or_default()
    ));

    Ok(format!(
        "({} -> {}, {} rows{})",
        adjustment.series, adjustment.output, rows, factor_range
    ))
}
