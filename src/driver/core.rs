//! Chrome recorder coordinator and session factory.
//!
//! The [`Driver`] holds validated configuration and turns it into running
//! [`Session`]s. Each session owns one browser process, one private
//! user-data directory, and one debugger connection.
//!
//! # Launch Sequence
//!
//! 1. Create a temporary user-data directory
//! 2. Pick an unused local port
//! 3. Spawn the browser with remote debugging on that port
//! 4. Wait for the page target per the [`Readiness`](super::Readiness) policy
//! 5. Connect to the page's WebSocket endpoint
//!
//! A failure at any step releases what earlier steps acquired.
//!
//! # Example
//!
//! ```no_run
//! use chrome_recorder::Driver;
//!
//! # async fn example() -> chrome_recorder::Result<()> {
//! let driver = Driver::builder().build()?;
//!
//! let result = driver.record_navigation("https://example.com").await?;
//! println!("{} network events", result.network_events.len());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::browser::{NavigationResult, Session};
use crate::error::{Error, Result};
use crate::transport::{Connection, Discovery};

use super::builder::{DriverBuilder, DriverConfig};
use super::process::{BrowserProcess, pick_unused_port};
use super::user_data::UserDataDir;

// ============================================================================
// Driver
// ============================================================================

/// Chrome session factory.
///
/// The driver is responsible for:
/// - Spawning Chrome processes with private user-data directories
/// - Discovering and connecting to the page target
/// - Running one recorded navigation per session
///
/// Cloning is cheap; clones share configuration.
#[derive(Clone)]
pub struct Driver {
    /// Shared configuration.
    config: Arc<DriverConfig>,
}

// ============================================================================
// Driver - Display
// ============================================================================

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("binary", &self.config.binary)
            .field("headless", &self.config.options.headless)
            .field("navigation_timeout", &self.config.navigation_timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Driver - Public API
// ============================================================================

impl Driver {
    /// Creates a configuration builder for the driver.
    #[inline]
    #[must_use]
    pub fn builder() -> DriverBuilder {
        DriverBuilder::new()
    }

    /// Returns the browser binary path.
    #[inline]
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.config.binary
    }

    /// Returns the bound on one navigation.
    #[inline]
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        self.config.navigation_timeout
    }

    /// Launches a browser and connects to its page target.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the user-data directory or port cannot be allocated
    /// - [`Error::ProcessLaunchFailed`] if the browser fails to start or exits early
    /// - [`Error::EndpointNotFound`] if no page target appears
    /// - [`Error::Connection`] if the WebSocket handshake fails
    pub async fn launch(&self) -> Result<Session> {
        let config = &self.config;

        let user_data = UserDataDir::new_temp()?;
        let port = pick_unused_port()?;
        let mut process = BrowserProcess::spawn(&config.binary, &config.options, port, &user_data)?;

        let ws_url = match Self::discover(config, port, &mut process).await {
            Ok(url) => url,
            Err(e) => {
                abort_launch(process, user_data).await;
                return Err(e);
            }
        };

        let connection = match Connection::connect(&ws_url).await {
            Ok(conn) => conn,
            Err(e) => {
                abort_launch(process, user_data).await;
                return Err(e);
            }
        };

        let session = Session::new(connection, process, user_data, port);
        info!(session_id = %session.id(), port, "Session started");
        Ok(session)
    }

    /// Launches a session, records one navigation, and tears the session down.
    ///
    /// The session is closed on every path, including navigation failure.
    /// A navigation that exceeds the timeout is not an error: the result has
    /// `timed_out` set.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `url` does not parse
    /// - Any [`launch`](Self::launch) error
    /// - Any [`Session::record_navigation`] error
    pub async fn record_navigation(&self, url: &str) -> Result<NavigationResult> {
        let url = Url::parse(url)
            .map_err(|e| Error::invalid_argument(format!("Invalid URL {url}: {e}")))?;

        if let Some(delay) = self.config.pre_navigation_delay {
            debug!(delay_ms = delay.as_millis() as u64, "Sleeping before launch");
            tokio::time::sleep(delay).await;
        }

        let session = self.launch().await?;
        let result = session
            .record_navigation(url.as_str(), self.config.navigation_timeout)
            .await;
        session.close().await;

        result
    }
}

// ============================================================================
// Driver - Internal API
// ============================================================================

impl Driver {
    /// Creates a driver from validated configuration.
    pub(crate) fn new(config: DriverConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Waits for the page endpoint, noticing a browser that died on startup.
    async fn discover(
        config: &DriverConfig,
        port: u16,
        process: &mut BrowserProcess,
    ) -> Result<String> {
        let discovery = Discovery::new(port)?;

        match config.readiness.wait_for_endpoint(&discovery).await {
            Ok(url) => Ok(url),
            Err(e) => match process.exit_status() {
                Some(status) => {
                    warn!(pid = process.pid(), %status, "Browser exited during startup");
                    Err(Error::ProcessLaunchFailed {
                        message: format!("browser exited during startup ({status})"),
                    })
                }
                None => Err(e),
            },
        }
    }
}

/// Releases the resources of a launch that failed part way.
async fn abort_launch(mut process: BrowserProcess, user_data: UserDataDir) {
    process.kill().await;
    user_data.cleanup();
}

// ============================================================================
// Tests
// ============================================================================
