//! scriv-worker - JSON offload worker process
//!
//! Reads NDJSON requests on stdin and writes one NDJSON response per
//! request on stdout. Diagnostics go to stderr; stdout carries nothing but
//! protocol lines.
//!
//! Usage:
//!   scriv-worker [--indent <width>]

use clap::Parser;
use std::process::ExitCode;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use scriv::config::FormatSettings;
use scriv::worker::service;

#[derive(Parser)]
#[command(name = "scriv-worker")]
#[command(about = "JSON offload worker for scriv")]
#[command(version)]
struct Args {
    /// Indent width for pretty-printed JSON.
    #[arg(long, default_value_t = 2)]
    indent: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let format = FormatSettings {
        indent: args.indent,
    };

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    match service::serve(stdin, stdout, &format).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "worker terminated with I/O error");
            ExitCode::FAILURE
        }
    }
}
