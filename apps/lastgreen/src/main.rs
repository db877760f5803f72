//! # lastgreen
//!
//! Report the last green run of a CI pipeline stage.
//!
//! ## Usage
//!
//! ```bash
//! # Poll once (reads only feed entries newer than the stored cursor)
//! lastgreen -p osito -s acceptance -f feed.json fetch
//!
//! # Only accept a green build built from a given upstream run
//! lastgreen fetch --dependency upstream=upstream/2/ready/3
//!
//! # Inspect what is remembered
//! lastgreen show
//! ```

use clap::Parser;
use lastgreen::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // LASTGREEN_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("LASTGREEN_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("lastgreen={default_level},lastgreen_core={default_level}").into()
    });

    // Logs go to stderr; stdout carries command output.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
