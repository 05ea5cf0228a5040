//! Browser launch and session factory.
//!
//! This module turns configuration into running sessions.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Driver`] | Factory for sessions and one-shot navigations |
//! | [`DriverBuilder`] | Fluent configuration builder |
//! | [`ChromeOptions`] | Browser command-line options |
//! | [`Readiness`] | How to wait for the debugging endpoint |
//! | [`BrowserProcess`] | Child process guard |
//! | [`UserDataDir`] | Temporary user-data directory |
//!
//! # Example
//!
//! ```no_run
//! use chrome_recorder::{Driver, Result};
//!
//! # async fn example() -> Result<()> {
//! let driver = Driver::builder().headless(true).build()?;
//!
//! let session = driver.launch().await?;
//! let result = session
//!     .record_navigation("https://example.com", driver.navigation_timeout())
//!     .await;
//! session.close().await;
//! # let _ = result?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for driver configuration.
pub mod builder;

/// Core driver implementation.
pub mod core;

/// Chrome command-line options.
pub mod options;

/// Browser process guard and port selection.
pub mod process;

/// Debugging endpoint readiness policies.
pub mod readiness;

/// Temporary user-data directory.
pub mod user_data;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{DEFAULT_CHROME_PATH, DEFAULT_NAVIGATION_TIMEOUT, DriverBuilder};
pub use core::Driver;
pub use options::ChromeOptions;
pub use process::BrowserProcess;
pub use readiness::Readiness;
pub use user_data::UserDataDir;
