//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Farebox - transit funding and ridership pipeline
#[derive(Parser, Debug)]
#[command(name = "fb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override database path, relative to the working directory (":memory:" for an in-memory store)
    #[arg(long, global = true)]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load wide source CSVs, clean and reshape them into long series
    Ingest(IngestArgs),

    /// Apply configured inflation adjustments
    Adjust(AdjustArgs),

    /// Run lagged percent-change analyses
    Lag(LagArgs),

    /// Pair two series and screen out non-positive and outlier rows
    Screen(ScreenArgs),

    /// Run ingest, adjust, lag and screen in order
    Run(RunArgs),

    /// Print a stored series as a wide table
    Export(ExportArgs),
}

/// Arguments for the ingest command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Source names to ingest (comma-separated, default: all)
    #[arg(short, long)]
    pub sources: Option<String>,
}

/// Arguments for the adjust command
#[derive(Args, Debug)]
pub struct AdjustArgs {
    /// Adjustment names to apply (comma-separated, default: all)
    #[arg(short, long)]
    pub adjustments: Option<String>,
}

/// Arguments for the lag command
#[derive(Args, Debug)]
pub struct LagArgs {
    /// Analysis names to run (comma-separated, default: all)
    #[arg(short, long)]
    pub analyses: Option<String>,

    /// Override the configured lag in years
    #[arg(short, long, allow_hyphen_values = true)]
    pub lag: Option<i32>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the screen command
#[derive(Args, Debug)]
pub struct ScreenArgs {
    /// Screen names to run (comma-separated, default: all)
    #[arg(short, long)]
    pub screens: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the configured lag of every analysis
    #[arg(short, long, allow_hyphen_values = true)]
    pub lag: Option<i32>,
}

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Series to export
    pub series: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Output formats for result-producing commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned text table
    Table,
    /// JSON document
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
