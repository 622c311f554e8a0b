//! `docket-dl` binary: parse arguments, install logging, run one download.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use docket_dl::{Cli, DocketDownloader, Error, ToExitCode};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error_code = e.error_code(), "Run failed");
            if e.interrupts_progress() {
                // Leave the in-place status line intact
                eprintln!();
            }
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let (dataset, config) = cli.into_parts()?;
    let downloader = DocketDownloader::new(config).await?;
    downloader.download(&dataset).await?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "docket_dl=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
