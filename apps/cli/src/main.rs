//! partdl - resumable command-line downloader
//!
//! Thin front-end over the partdl-core engine: parse arguments, drive the
//! session's progress sequence, render it. All download logic lives in the
//! core crate.

mod progress;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use url::Url;

use partdl_core::{DownloadSession, SessionConfig, DEFAULT_CHUNK_SIZE};
use partdl_types::DownloadTarget;

/// partdl - resumable HTTP(S) downloader
#[derive(Parser)]
#[command(name = "partdl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// URL to download
    url: String,

    /// Output file path (defaults to the URL's file name)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Chunk size in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: u64,

    /// ASCII-only status output (no Unicode prefixes)
    #[arg(long)]
    ascii: bool,

    /// Emit one JSON progress event per line instead of a progress bar
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "partdl=debug".into()),
            )
            .init();
    }

    let url = Url::parse(&cli.url).context("invalid URL")?;
    let destination = match cli.output {
        Some(path) => path,
        None => PathBuf::from(default_file_name(&url)),
    };

    let config = SessionConfig {
        chunk_size: cli.chunk_size,
        ..SessionConfig::default()
    };
    let target = DownloadTarget::new(url.to_string(), destination.clone());
    let mut session = DownloadSession::start(target, config)
        .await
        .with_context(|| format!("cannot download {}", url))?;

    if cli.json {
        while let Some(event) = session.next_event().await? {
            println!("{}", serde_json::to_string(&event)?);
        }
    } else {
        println!("Downloading {} =>\n  {}", url, destination.display());
        let mut renderer =
            progress::ProgressRenderer::new(session.expected_size(), cli.ascii);
        while let Some(event) = session.next_event().await? {
            renderer.handle(&event);
        }
        renderer.finish(&destination);
    }

    Ok(())
}

/// Last non-empty path segment of the URL, or "download".
fn default_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("download")
        .to_string()
}
