//! Farebox CLI - transit funding and ridership pipeline

use clap::Parser;

mod cli;
mod commands;
mod context;

use cli::Cli;
use commands::common::ExitCode;
use commands::{adjust, export, ingest, lag, run, screen};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let result = match &cli.command {
        cli::Commands::Ingest(args) => ingest::execute(args, &cli.global).await,
        cli::Commands::Adjust(args) => adjust::execute(args, &cli.global).await,
        cli::Commands::Lag(args) => lag::execute(args, &cli.global).await,
        cli::Commands::Screen(args) => screen::execute(args, &cli.global).await,
        cli::Commands::Run(args) => run::execute(args, &cli.global).await,
        cli::Commands::Export(args) => export::execute(args, &cli.global).await,
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ExitCode>() {
            Some(ExitCode(code)) => std::process::ExitCode::from(*code as u8),
            None => {
                eprintln!("Error: {err:#}");
                std::process::ExitCode::FAILURE
            }
        },
    }
}

/// Install the logger: `RUST_LOG` wins, otherwise `warn` (or `info` with
/// `--verbose`).
fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
