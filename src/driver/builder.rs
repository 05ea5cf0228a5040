//! Builder pattern for driver configuration.
//!
//! Provides a fluent API for configuring and creating [`Driver`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use chrome_recorder::Driver;
//!
//! # fn example() -> chrome_recorder::Result<()> {
//! let driver = Driver::builder()
//!     .binary("/usr/bin/google-chrome")
//!     .headless(true)
//!     .navigation_timeout(Duration::from_secs(60))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

use super::core::Driver;
use super::options::ChromeOptions;
use super::readiness::Readiness;

// ============================================================================
// Constants
// ============================================================================

/// Default browser executable.
pub const DEFAULT_CHROME_PATH: &str = "/usr/bin/google-chrome";

/// Default bound on one navigation.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(90);

// ============================================================================
// DriverBuilder
// ============================================================================

/// Builder for configuring a [`Driver`] instance.
///
/// Use [`Driver::builder()`] to create a new builder.
#[derive(Debug, Clone)]
pub struct DriverBuilder {
    /// Path to the Chrome binary.
    binary: PathBuf,
    /// Browser command-line options.
    options: ChromeOptions,
    /// Bound on one navigation.
    navigation_timeout: Duration,
    /// Sleep before each launch.
    pre_navigation_delay: Option<Duration>,
    /// How to wait for the debugging endpoint.
    readiness: Readiness,
}

impl Default for DriverBuilder {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_CHROME_PATH),
            options: ChromeOptions::headless(),
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            pre_navigation_delay: None,
            readiness: Readiness::default(),
        }
    }
}

// ============================================================================
// DriverBuilder Implementation
// ============================================================================

impl DriverBuilder {
    /// Creates a builder with headless defaults.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Chrome executable: a path, or a bare name looked up on `PATH`.
    #[inline]
    #[must_use]
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = path.into();
        self
    }

    /// Sets headless mode on or off.
    #[inline]
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.options = self.options.with_headless_mode(headless);
        self
    }

    /// Sets the window size in pixels.
    #[inline]
    #[must_use]
    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.options = self.options.with_window_size(width, height);
        self
    }

    /// Adds an extra command-line argument.
    #[inline]
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.options = self.options.with_arg(arg);
        self
    }

    /// Replaces the browser options wholesale.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ChromeOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the bound on one navigation.
    #[inline]
    #[must_use]
    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Sleeps this long before each browser launch.
    #[inline]
    #[must_use]
    pub fn pre_navigation_delay(mut self, delay: Duration) -> Self {
        self.pre_navigation_delay = Some(delay);
        self
    }

    /// Sets the readiness policy.
    #[inline]
    #[must_use]
    pub fn readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }

    /// Builds the driver with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::BrowserNotFound`] if the binary path doesn't exist and is
    ///   not a name found on `PATH`
    /// - [`Error::Config`] if the options or timeouts are invalid
    pub fn build(self) -> Result<Driver> {
        let binary = self.resolve_binary()?;
        self.options.validate().map_err(Error::config)?;

        if self.navigation_timeout.is_zero() {
            return Err(Error::config("Navigation timeout must be greater than zero"));
        }

        Ok(Driver::new(DriverConfig {
            binary,
            options: self.options,
            navigation_timeout: self.navigation_timeout,
            pre_navigation_delay: self.pre_navigation_delay,
            readiness: self.readiness,
        }))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl DriverBuilder {
    /// Resolves the binary to an existing path.
    ///
    /// A bare name such as `google-chrome` is looked up on `PATH`.
    fn resolve_binary(&self) -> Result<PathBuf> {
        if self.binary.exists() {
            return Ok(self.binary.clone());
        }

        let bare_name = self.binary.components().count() == 1 && !self.binary.has_root();
        if bare_name && let Ok(path) = which::which(&self.binary) {
            debug!(
                name = %self.binary.display(),
                path = %path.display(),
                "Resolved browser on PATH"
            );
            return Ok(path);
        }

        Err(Error::browser_not_found(&self.binary))
    }
}

// ============================================================================
// DriverConfig
// ============================================================================

/// Validated driver configuration.
#[derive(Debug, Clone)]
pub(crate) struct DriverConfig {
    pub binary: PathBuf,
    pub options: ChromeOptions,
    pub navigation_timeout: Duration,
    pub pre_navigation_delay: Option<Duration>,
    pub readiness: Readiness,
}

// ============================================================================
// Tests
// ============================================================================
