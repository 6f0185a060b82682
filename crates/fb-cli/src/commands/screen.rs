//! Screen command implementation

use anyhow::Result;
use fb_core::config::ScreenConfig;
use fb_core::{pair_observations, ScreenOutcome};
use serde::Serialize;

use super::common::{
    exit_code_for, format_number, print_json, print_table, select_by_name, ExitCode,
};
use crate::cli::{GlobalArgs, OutputFormat, ScreenArgs};
use crate::context::RuntimeContext;

#[derive(Debug, Serialize)]
struct ScreenResult<'a> {
    screen: &'a str,
    series_a: &'a str,
    series_b: &'a str,
    #[serde(flatten)]
    outcome: ScreenOutcome,
}

/// Execute the screen command
pub(crate) async fn execute(args: &ScreenArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    run_screens(&ctx, args.screens.as_deref(), args.output).await
}

/// Pair and screen the selected series pairs, reporting every exclusion.
pub(crate) async fn run_screens(
    ctx: &RuntimeContext,
    filter: Option<&str>,
    output: OutputFormat,
) -> Result<()> {
    let screens = select_by_name(&ctx.project.config.screens, filter, "screen", |s| {
        s.name.as_str()
    })?;

    if screens.is_empty() {
        if output == OutputFormat::Table {
            println!("No screens configured.");
        }
        return Ok(());
    }

    let mut results = Vec::with_capacity(screens.len());
    for config in screens {
        match screen_pair(ctx, config).await {
            Ok(outcome) => results.push(ScreenResult {
                screen: &config.name,
                series_a: config.series_a.as_str(),
                series_b: config.series_b.as_str(),
                outcome,
            }),
            Err(e) => {
                eprintln!("✗ {} - {:#}", config.name, e);
                return Err(ExitCode(exit_code_for(&e)).into());
            }
        }
    }

    match output {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Table => results.iter().for_each(print_screen),
    }
    Ok(())
}

async fn screen_pair(ctx: &RuntimeContext, config: &ScreenConfig) -> Result<ScreenOutcome> {
    let a = ctx.read_series(&config.series_a).await?;
    let b = ctx.read_series(&config.series_b).await?;
    let paired = pair_observations(&a, &b);
    ctx.verbose(&format!(
        "Screen '{}': {} paired observations",
        config.name,
        paired.len()
    ));
    Ok(fb_core::screen(paired, &config.bounds()))
}

fn print_screen(result: &ScreenResult<'_>) {
    let outcome = &result.outcome;
    println!(
        "{}: {} vs {}\n",
        result.screen, result.series_a, result.series_b
    );
    println!(
        "  {} kept, {} excluded ({} entities affected, {} fully excluded)",
        outcome.kept.len(),
        outcome.excluded.len(),
        outcome.excluded_entities().len(),
        outcome.fully_excluded_entities().len()
    );

    if !outcome.excluded.is_empty() {
        println!();
        let rows: Vec<Vec<String>> = outcome
            .excluded
            .iter()
            .map(|e| {
                vec![
                    e.observation.entity.clone(),
                    e.observation.year.to_string(),
                    format_number(e.observation.value_a),
                    format_number(e.observation.value_b),
                    e.reason.to_string(),
                ]
            })
            .collect();
        print_table(&["ENTITY", "YEAR", "VALUE_A", "VALUE_B", "REASON"], &rows);
    }
    println!();
}
