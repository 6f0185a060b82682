//! Export command implementation

use anyhow::{Context, Result};
use fb_core::{pivot_wide, SeriesName, WideTable, YearRange};
use serde_json::{Map, Value};

use super::common::{cell_to_json, format_cell, print_json, print_table};
use crate::cli::{ExportArgs, GlobalArgs, OutputFormat};
use crate::context::RuntimeContext;

/// Execute the export command
pub(crate) async fn execute(args: &ExportArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    let name = SeriesName::parse(args.series.as_str())?;
    let series = ctx.read_series(&name).await?;

    let observed = series.observed_years();
    let years = match (observed.first(), observed.last()) {
        (Some(&first), Some(&last)) => YearRange::new(first, last)?,
        _ => {
            if args.output == OutputFormat::Table {
                println!("Series '{}' has no rows.", name);
            } else {
                print_json(&Vec::<Value>::new())?;
            }
            return Ok(());
        }
    };

    let table = pivot_wide(&series, years);
    match args.output {
        OutputFormat::Table => {
            let headers: Vec<&str> = table.headers.iter().map(String::as_str).collect();
            let rows: Vec<Vec<String>> = table
                .rows
                .iter()
                .map(|row| row.iter().map(format_cell).collect())
                .collect();
            print_table(&headers, &rows);
        }
        OutputFormat::Json => {
            print_json(&wide_to_json(&table)).context("Failed to serialize export")?;
        }
    }
    Ok(())
}

/// One JSON object per row, keyed by header.
fn wide_to_json(table: &WideTable) -> Vec<Value> {
    table
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = table
                .headers
                .iter()
                .cloned()
                .zip(row.iter().map(cell_to_json))
                .collect();
            Value::Object(object)
        })
        .collect()
}
