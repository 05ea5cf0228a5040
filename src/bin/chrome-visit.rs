//! Visits web pages in headless Chrome and records screenshots.
//!
//! ```text
//! chrome-visit https://example.com
//! chrome-visit --urls urls.txt --vpn nl.ovpn de.ovpn --vpnauth creds.txt
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::process::ExitCode;

use chrome_recorder::cli::{self, Args};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Logging
// ============================================================================

/// Initialize tracing/logging. `RUST_LOG` takes precedence over `--debug`.
fn init_logging(debug: bool) {
    let fallback = if debug {
        "chrome_recorder=debug"
    } else {
        "chrome_recorder=info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match cli::run(&args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "chrome-visit failed");
            ExitCode::FAILURE
        }
    }
}
