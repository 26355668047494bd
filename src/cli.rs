//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Fetch a batch of URLs concurrently and summarize the responses.
///
/// Reads a JSON array or object of request descriptors (bare URLs or
/// objects with an identifier and a URL field) and prints a JSON summary.
#[derive(Parser, Debug)]
#[command(name = "http-pool")]
#[command(author, version, about)]
pub struct Args {
    /// JSON input file (reads stdin when omitted or "-")
    pub input: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum in-flight requests per chunk (1-1000)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u16).range(1..=1000))]
    pub concurrency: Option<u16>,

    /// Maximum requests per chunk (1-10000)
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u16).range(1..=10000))]
    pub pool_limit: Option<u16>,

    /// Maximum connection handles kept open (1-1000)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=1000))]
    pub max_handles: Option<u16>,

    /// Maximum redirects followed per request (0 disables, max 50)
    #[arg(long, value_parser = clap::value_parser!(u16).range(0..=50))]
    pub max_redirects: Option<u16>,

    /// Per-request timeout in seconds (1-3600)
    #[arg(short = 't', long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    /// Field holding the request identifier
    #[arg(long)]
    pub id_key: Option<String>,

    /// Field holding the request URL
    #[arg(long)]
    pub url_key: Option<String>,

    /// Use each URL as its request identifier
    #[arg(long)]
    pub url_as_id: bool,

    /// Bound buffered response bodies, e.g. 512M or 2G
    #[arg(short = 'm', long)]
    pub memory_limit: Option<String>,

    /// Print pool progress lines
    #[arg(long)]
    pub progress: bool,

    /// Ignore the config file
    #[arg(long)]
    pub no_config: bool,

    /// Pretty-print the JSON summary
    #[arg(long)]
    pub pretty: bool,
}
