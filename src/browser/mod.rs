//! Browser session module.
//!
//! This module provides the types for working with one page target:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Session`] | Connected page target (owns process, directory, connection) |
//! | [`NavigationResult`] | Events and screenshot of one recorded navigation |
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use chrome_recorder::{Driver, Result};
//!
//! # async fn example() -> Result<()> {
//! let driver = Driver::builder().build()?;
//! let session = driver.launch().await?;
//!
//! let result = session
//!     .record_navigation("https://example.com", Duration::from_secs(30))
//!     .await;
//! session.close().await;
//!
//! let result = result?;
//! if let Some(png) = result.screenshot {
//!     std::fs::write("example.png", png)?;
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Recorded navigation.
pub mod navigation;

/// PNG screenshot capture.
mod screenshot;

/// Page target session.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use navigation::{NavigationOutcome, NavigationResult};
pub use session::Session;
