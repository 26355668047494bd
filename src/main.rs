//! CLI entry point for the http-pool tool.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;
use http_pool::HttpPool;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

mod cli;
mod config;
mod progress;

use cli::Args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries the JSON summary; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let file_config = if args.no_config {
        None
    } else {
        config::load_default_file_config()?
    };
    let settings = config::resolve(&args, file_config.as_ref());
    debug!(?settings, "settings resolved");

    let Some(raw) = read_input(args.input.as_deref())? else {
        info!("No input provided. Pass a JSON file or pipe JSON via stdin.");
        info!(r#"Example: echo '["https://example.com"]' | http-pool"#);
        return Ok(ExitCode::SUCCESS);
    };

    let value: Value = serde_json::from_str(&raw).context("Input is not valid JSON")?;
    let mut pool = HttpPool::from_json(value)?
        .with_options(settings.options)
        .with_identifier_key(settings.keys.identifier)
        .with_url_key(settings.keys.url)
        .with_url_as_identifier(settings.keys.url_as_identifier);

    info!(requests = pool.request_count(), "Starting pool");

    let domain = pool
        .requests()
        .first()
        .and_then(|item| item.url())
        .and_then(|url| Url::parse(url).ok())
        .and_then(|url| url.host_str().map(str::to_string));
    let use_spinner = !args.quiet && !pool.options().verbose && io::stderr().is_terminal();
    let (spinner, stop) = progress::spawn_progress_ui(use_spinner, pool.request_count(), domain);

    let outcome = pool.execute().await;

    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = spinner
        && let Err(e) = handle.await
    {
        warn!(error = %e, "progress task failed");
    }

    let result = outcome?;
    for error in result.errors() {
        warn!(error = %error, "pool error");
    }

    let summary = result.summary();
    let output = if args.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{output}");

    info!(
        fulfilled = summary.fulfilled_count,
        rejected = summary.rejected_count,
        diff = summary.diff,
        "Pool complete"
    );

    Ok(if result.is_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Reads the JSON input from a file, or from stdin when it is piped.
///
/// Blank stdin counts as no input.
fn read_input(path: Option<&Path>) -> Result<Option<String>> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("Failed to read input file '{}'", path.display())),
        _ if !io::stdin().is_terminal() => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok((!buffer.trim().is_empty()).then_some(buffer))
        }
        _ => Ok(None),
    }
}
