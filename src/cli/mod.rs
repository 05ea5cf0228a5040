//! `chrome-visit` command line front end.
//!
//! Visits each URL in a fresh headless Chrome, optionally through each of
//! several OpenVPN tunnels, and writes a screenshot per visit.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `output` | Screenshot file naming and writing |
//! | `tunnel` | OpenVPN subprocess |
//!
//! # Loop
//!
//! ```text
//! for config in tunnel configs (or once, without a tunnel):
//!     for url in urls:
//!         bring tunnel up → record navigation → write screenshot → tear tunnel down
//! ```
//!
//! A failed or timed-out visit is logged and the loop moves on.

// ============================================================================
// Submodules
// ============================================================================

/// Screenshot file naming and writing.
pub mod output;

/// OpenVPN tunnel subprocess.
pub mod tunnel;

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use crate::driver::{DEFAULT_CHROME_PATH, Driver};
use crate::error::{Error, Result};

use output::{DEFAULT_OUTPUT_DIR, screenshot_path, write_screenshot};
use tunnel::{DEFAULT_TUNNEL_SETTLE, Tunnel};

// ============================================================================
// Args
// ============================================================================

/// Visits web pages in headless Chrome and records screenshots.
#[derive(Parser, Debug, Clone)]
#[command(name = "chrome-visit", version, about)]
pub struct Args {
    /// URL to visit.
    #[arg(required_unless_present = "urls")]
    pub url: Option<String>,

    /// File containing URLs to visit, one per line.
    #[arg(long, value_name = "FILE")]
    pub urls: Option<PathBuf>,

    /// OpenVPN config file(s); each URL is visited through each tunnel.
    #[arg(long, value_name = "CONFIG", num_args = 1..)]
    pub vpn: Vec<PathBuf>,

    /// OpenVPN credentials file.
    #[arg(long, value_name = "FILE", requires = "vpn")]
    pub vpnauth: Option<PathBuf>,

    /// Chrome executable path, or a name to look up on PATH.
    #[arg(long, value_name = "PATH", env = "CHROME_PATH", default_value = DEFAULT_CHROME_PATH)]
    pub chrome: PathBuf,

    /// Show the browser window.
    #[arg(long)]
    pub no_headless: bool,

    /// Seconds to wait for each page to load.
    #[arg(long, value_name = "SECS", default_value_t = 90)]
    pub timeout: u64,

    /// Seconds to sleep before each visit.
    #[arg(long, value_name = "SECS")]
    pub sleep: Option<u64>,

    /// Directory for screenshots.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Returns the URLs to visit.
    ///
    /// With `--urls`, the file's trimmed non-empty lines; otherwise the
    /// positional URL.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the URL file cannot be read
    /// - [`Error::InvalidArgument`] if no URL is given
    pub async fn load_urls(&self) -> Result<Vec<String>> {
        if let Some(path) = &self.urls {
            let text = tokio::fs::read_to_string(path).await?;
            let urls = parse_url_list(&text);
            if urls.is_empty() {
                return Err(Error::invalid_argument(format!(
                    "No URLs in {}",
                    path.display()
                )));
            }
            return Ok(urls);
        }

        self.url
            .clone()
            .map(|u| vec![u.trim().to_string()])
            .ok_or_else(|| Error::invalid_argument("A URL or --urls file is required"))
    }

    /// Builds the driver described by the flags.
    ///
    /// # Errors
    ///
    /// See [`DriverBuilder::build`](crate::DriverBuilder::build).
    pub fn build_driver(&self) -> Result<Driver> {
        let mut builder = Driver::builder()
            .binary(&self.chrome)
            .headless(!self.no_headless)
            .navigation_timeout(Duration::from_secs(self.timeout));

        if let Some(secs) = self.sleep {
            builder = builder.pre_navigation_delay(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Returns the tunnel configs to iterate, `None` meaning no tunnel.
    fn tunnel_configs(&self) -> Vec<Option<&Path>> {
        if self.vpn.is_empty() {
            vec![None]
        } else {
            self.vpn.iter().map(|p| Some(p.as_path())).collect()
        }
    }
}

/// Splits a URL list into trimmed, non-empty lines.
#[must_use]
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Summary
// ============================================================================

/// Counts of what happened during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Visits attempted.
    pub visited: usize,
    /// Screenshots written.
    pub screenshots: usize,
    /// Visits that hit the navigation timeout.
    pub timed_out: usize,
    /// Visits that failed with an error.
    pub failed: usize,
}

// ============================================================================
// Run
// ============================================================================

/// Runs every visit the flags describe.
///
/// # Errors
///
/// Only setup errors (bad flags, unreadable URL file, missing browser).
/// Individual visit failures are logged and counted.
pub async fn run(args: &Args) -> Result<Summary> {
    let urls = args.load_urls().await?;
    let driver = args.build_driver()?;
    let mut summary = Summary::default();

    for config in args.tunnel_configs() {
        for url in &urls {
            visit(&driver, args, config, url, &mut summary).await;
        }
    }

    info!(
        visited = summary.visited,
        screenshots = summary.screenshots,
        timed_out = summary.timed_out,
        failed = summary.failed,
        "Run finished"
    );

    Ok(summary)
}

/// Performs one visit, optionally inside a tunnel.
async fn visit(
    driver: &Driver,
    args: &Args,
    config: Option<&Path>,
    url: &str,
    summary: &mut Summary,
) {
    summary.visited += 1;

    let tunnel = match config {
        Some(config) => {
            match Tunnel::start(config, args.vpnauth.as_deref(), DEFAULT_TUNNEL_SETTLE).await {
                Ok(tunnel) => Some(tunnel),
                Err(e) => {
                    error!(config = %config.display(), error = %e, "Tunnel failed to start");
                    summary.failed += 1;
                    return;
                }
            }
        }
        None => None,
    };

    info!(%url, "Opening");

    match driver.record_navigation(url).await {
        Ok(result) if result.timed_out => {
            warn!(%url, events = result.network_events.len(), "Visit timed out");
            summary.timed_out += 1;
        }

        Ok(result) => {
            if let Some(bytes) = &result.screenshot {
                let path = screenshot_path(&args.output, url, config);
                match write_screenshot(&path, bytes).await {
                    Ok(()) => summary.screenshots += 1,
                    Err(e) => {
                        error!(path = %path.display(), error = %e, "Failed to write screenshot");
                        summary.failed += 1;
                    }
                }
            }
        }

        Err(e) => {
            error!(%url, error = %e, "Visit failed");
            summary.failed += 1;
        }
    }

    if let Some(tunnel) = tunnel {
        tunnel.teardown().await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let args = Args::try_parse_from(["chrome-visit", "https://example.com"]).expect("parse");
        assert_eq!(args.url.as_deref(), Some("https://example.com"));
        assert_eq!(args.timeout, 90);
        assert_eq!(args.output, PathBuf::from("results"));
        assert!(args.vpn.is_empty());
        assert!(!args.no_headless);
        assert!(args.sleep.is_none());
    }

    #[test]
    fn test_parse_full() {
        let args = Args::try_parse_from([
            "chrome-visit",
            "--urls",
            "list.txt",
            "--vpn",
            "a.ovpn",
            "b.ovpn",
            "--vpnauth",
            "auth.txt",
            "--chrome",
            "/opt/chrome",
            "--no-headless",
            "--timeout",
            "30",
            "--sleep",
            "8",
            "--output",
            "shots",
            "--debug",
        ])
        .expect("parse");

        assert!(args.url.is_none());
        assert_eq!(args.urls, Some(PathBuf::from("list.txt")));
        assert_eq!(args.vpn, vec![PathBuf::from("a.ovpn"), PathBuf::from("b.ovpn")]);
        assert_eq!(args.vpnauth, Some(PathBuf::from("auth.txt")));
        assert_eq!(args.chrome, PathBuf::from("/opt/chrome"));
        assert!(args.no_headless);
        assert_eq!(args.timeout, 30);
        assert_eq!(args.sleep, Some(8));
        assert_eq!(args.output, PathBuf::from("shots"));
        assert!(args.debug);
    }

    #[test]
    fn test_url_or_list_required() {
        assert!(Args::try_parse_from(["chrome-visit"]).is_err());
    }

    #[test]
    fn test_vpnauth_requires_vpn() {
        let result =
            Args::try_parse_from(["chrome-visit", "https://example.com", "--vpnauth", "a.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_url_list() {
        let urls = parse_url_list("https://a.com\n\n  https://b.com  \r\n\t\n");
        assert_eq!(urls, vec!["https://a.com", "https://b.com"]);
    }

    #[test]
    fn test_tunnel_configs() {
        let args = Args::try_parse_from(["chrome-visit", "x"]).expect("parse");
        assert_eq!(args.tunnel_configs(), vec![None]);

        let args =
            Args::try_parse_from(["chrome-visit", "x", "--vpn", "a.ovpn"]).expect("parse");
        assert_eq!(args.tunnel_configs(), vec![Some(Path::new("a.ovpn"))]);
    }

    #[tokio::test]
    async fn test_load_urls_from_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let list = dir.path().join("urls.txt");
        std::fs::write(&list, "https://a.com\nhttps://b.com\n").expect("write");

        let args = Args::try_parse_from([
            "chrome-visit",
            "--urls",
            list.to_str().expect("utf-8 path"),
        ])
        .expect("parse");

        let urls = args.load_urls().await.expect("urls");
        assert_eq!(urls, vec!["https://a.com", "https://b.com"]);
    }

    #[tokio::test]
    async fn test_load_urls_empty_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let list = dir.path().join("urls.txt");
        std::fs::write(&list, "\n\n").expect("write");

        let args = Args::try_parse_from([
            "chrome-visit",
            "--urls",
            list.to_str().expect("utf-8 path"),
        ])
        .expect("parse");

        let err = args.load_urls().await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_run_with_missing_browser() {
        let args = Args::try_parse_from([
            "chrome-visit",
            "https://example.com",
            "--chrome",
            "/nonexistent/chrome",
        ])
        .expect("parse");

        let err = run(&args).await.unwrap_err();
        assert!(matches!(err, Error::BrowserNotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_visit_is_counted() {
        // The URL is rejected before any browser is launched
        let args = Args::try_parse_from([
            "chrome-visit",
            "not a url",
            "--chrome",
            "/bin/true",
        ])
        .expect("parse");

        let summary = run(&args).await.expect("run");
        assert_eq!(
            summary,
            Summary {
                visited: 1,
                screenshots: 0,
                timed_out: 0,
                failed: 1,
            }
        );
    }
}
