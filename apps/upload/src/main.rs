//! `upload` entry point: streams one file to a receiver with a live
//! progress line on stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use clap::error::ErrorKind;
use console::style;
use pipedrop_transfer::ProgressRenderer;
use pipedrop_upload::{
    ConfigError, DestinationConfig, EXIT_INTERRUPTED, EXIT_USAGE, UploadError, UploadOptions,
    Uploader,
};
use tracing_subscriber::EnvFilter;

/// Upload a file to a pipedrop receiver.
#[derive(Debug, Parser)]
#[command(name = "upload", version, about)]
struct Cli {
    /// File to upload.
    file: PathBuf,

    /// Destination URL. Overrides `destination` from config.json.
    #[arg(long)]
    url: Option<String>,

    /// Overall request timeout in seconds (no timeout by default).
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Progress refresh interval in milliseconds.
    #[arg(long, value_name = "MILLIS", default_value_t = 100,
          value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,
}

impl Cli {
    fn options(&self) -> UploadOptions {
        UploadOptions {
            tick_interval: Duration::from_millis(self.interval),
            timeout: self.timeout.map(Duration::from_secs),
        }
    }

    fn destination(&self) -> Result<String, UploadError> {
        match &self.url {
            Some(url) => Ok(url.clone()),
            None => {
                let dir = std::env::current_dir().map_err(|source| ConfigError::Read {
                    path: PathBuf::from("."),
                    source,
                })?;
                Ok(DestinationConfig::load(&dir)?.destination)
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => EXIT_USAGE,
            };
            // Printing to a closed stdio is not worth reporting.
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{} failed to start runtime: {e}", style("error:").red().bold());
            return ExitCode::FAILURE;
        }
    };

    // Dropping the upload future on Ctrl-C runs its terminal guard, so line
    // wrap is restored before the process exits.
    let outcome = runtime.block_on(async {
        tokio::select! {
            result = run(&cli) => Some(result),
            () = interrupted() => None,
        }
    });

    match outcome {
        None => {
            eprintln!("{} upload interrupted", style("error:").red().bold());
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Some(Ok(summary)) => {
            eprintln!("{} {summary}", style("done:").green().bold());
            ExitCode::SUCCESS
        }
        Some(Err(err)) => {
            eprintln!("{} {err}", style("error:").red().bold());
            ExitCode::from(err.exit_code())
        }
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}

async fn run(cli: &Cli) -> Result<String, UploadError> {
    let destination = cli.destination()?;
    let uploader = Uploader::new(cli.options())?;
    let report = uploader
        .upload(&cli.file, &destination, ProgressRenderer::stderr())
        .await?;
    tracing::debug!(url = %report.url, "upload finished");
    Ok(report.summary())
}
