//! Lag command implementation

use anyhow::Result;
use fb_core::config::AnalysisConfig;
use fb_core::{lag_join_many, LagJoinOutcome, Series};
use serde::Serialize;

use super::common::{
    exit_code_for, format_number, print_json, print_table, select_by_name, ExitCode,
};
use crate::cli::{GlobalArgs, LagArgs, OutputFormat};
use crate::context::RuntimeContext;

/// All outcomes of one configured analysis
#[derive(Debug, Serialize)]
struct AnalysisResult<'a> {
    analysis: &'a str,
    lag: i32,
    outcomes: Vec<LagJoinOutcome>,
}

/// Execute the lag command
pub(crate) async fn execute(args: &LagArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    run_analyses(&ctx, args.analyses.as_deref(), args.lag, args.output).await
}

/// Run the selected analyses and print their aligned rows and reports.
pub(crate) async fn run_analyses(
    ctx: &RuntimeContext,
    filter: Option<&str>,
    lag_override: Option<i32>,
    output: OutputFormat,
) -> Result<()> {
    let analyses = select_by_name(
        &ctx.project.config.analyses,
        filter,
        "analysis",
        |a| a.name.as_str(),
    )?;

    if analyses.is_empty() {
        if output == OutputFormat::Table {
            println!("No analyses configured.");
        }
        return Ok(());
    }

    let mut results = Vec::with_capacity(analyses.len());
    for analysis in analyses {
        let lag = lag_override.unwrap_or(analysis.lag);
        let outcomes = match analyze(ctx, analysis, lag).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                eprintln!("✗ {} - {:#}", analysis.name, e);
                return Err(ExitCode(exit_code_for(&e)).into());
            }
        };
        results.push(AnalysisResult {
            analysis: &analysis.name,
            lag,
            outcomes,
        });
    }

    match output {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Table => results.iter().for_each(print_analysis),
    }
    Ok(())
}

async fn analyze(
    ctx: &RuntimeContext,
    analysis: &AnalysisConfig,
    lag: i32,
) -> Result<Vec<LagJoinOutcome>> {
    let funding = ctx.read_series(&analysis.funding).await?;
    let eligibility = ctx.read_series(&analysis.eligibility.series).await?;

    let mut responses: Vec<Series> = Vec::with_capacity(analysis.responses.len());
    for name in &analysis.responses {
        responses.push(ctx.read_series(name).await?);
    }
    let response_refs: Vec<&Series> = responses.iter().collect();

    ctx.verbose(&format!(
        "Analysis '{}': {} funding rows, {} responses, lag {}",
        analysis.name,
        funding.len(),
        responses.len(),
        lag
    ));

    Ok(lag_join_many(
        &funding,
        &response_refs,
        lag,
        &eligibility,
        analysis.eligibility.threshold,
        analysis.coverage,
    ))
}

fn print_analysis(result: &AnalysisResult<'_>) {
    for outcome in &result.outcomes {
        let report = &outcome.report;
        println!(
            "{}: {} -> {} (lag {}, {} >= {})\n",
            result.analysis,
            report.funding,
            report.response,
            result.lag,
            report.eligibility,
            format_number(report.threshold)
        );

        if outcome.rows.is_empty() {
            println!("  No aligned rows.");
        } else {
            let rows: Vec<Vec<String>> = outcome
                .rows
                .iter()
                .map(|r| {
                    vec![
                        r.entity.clone(),
                        r.year_a.to_string(),
                        r.year_b.to_string(),
                        format!("{:.2}", r.pct_change_a),
                        format!("{:.2}", r.pct_change_b),
                        format_number(r.auxiliary_value),
                    ]
                })
                .collect();
            print_table(
                &[
                    "ENTITY",
                    "YEAR_A",
                    "YEAR_B",
                    "PCT_CHANGE_A",
                    "PCT_CHANGE_B",
                    "ELIGIBILITY",
                ],
                &rows,
            );
        }

        println!();
        println!(
            "  {} candidates: {} unmatched, {} ineligible, {} undefined change, {} emitted",
            report.candidates,
            report.unmatched,
            report.ineligible,
            report.undefined_change,
            report.emitted
        );
        println!(
            "  {} of {} funding entities retained",
            report.retained_entities, report.funding_entities
        );
        if let Some((a, b)) = outcome.change_ranges() {
            println!(
                "  pct_change_a range {:.2}..{:.2}, pct_change_b range {:.2}..{:.2}",
                a.min, a.max, b.min, b.max
            );
        }
        for warning in &report.warnings {
            println!("  ⚠ {}", warning);
        }
        println!();
    }
}
