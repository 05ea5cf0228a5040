//! Chrome Recorder - record page navigations over the DevTools Protocol.
//!
//! This library launches Chrome with remote debugging enabled, connects to
//! its page target over WebSocket, and records what happens when a URL is
//! loaded: every `Network.*` event until the page finishes (or its main
//! document fails), followed by a screenshot.
//!
//! # Architecture
//!
//! The client speaks the DevTools Protocol over one WebSocket:
//!
//! - **Commands**: numbered `{id, method, params}` frames, answered by a
//!   response carrying the same `id`
//! - **Events**: unsolicited `{method, params}` frames
//!
//! Key design principles:
//!
//! - Each [`Session`] owns: Chrome process + user-data directory + connection
//! - One task per connection reads the socket and dispatches frames
//! - Responses are routed by id, events to a single subscription
//! - Command ids are per connection, starting at 0
//!
//! # Quick Start
//!
//! ```no_run
//! use chrome_recorder::{Driver, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let driver = Driver::builder()
//!         .binary("/usr/bin/google-chrome")
//!         .headless(true)
//!         .build()?;
//!
//!     let result = driver.record_navigation("https://example.com").await?;
//!
//!     println!("{} network events", result.network_events.len());
//!     if let Some(png) = result.screenshot {
//!         std::fs::write("example.png", png)?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | Sessions, recorded navigation, screenshots |
//! | [`cli`] | `chrome-visit` command line front end |
//! | [`driver`] | Browser launch and configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | DevTools message types |
//! | [`transport`] | WebSocket connection and endpoint discovery |

// ============================================================================
// Modules
// ============================================================================

/// Sessions, recorded navigation, and screenshots.
///
/// - [`Session`] - Connected page target
/// - [`NavigationResult`] - Outcome of one recorded navigation
pub mod browser;

/// `chrome-visit` command line front end.
pub mod cli;

/// Browser launch and configuration.
///
/// Use [`Driver::builder()`] to create a configured driver instance.
pub mod driver;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// DevTools protocol message types.
///
/// Defines the request/response/event envelope and the commands used.
pub mod protocol;

/// WebSocket transport layer.
///
/// Handles the debugger connection and endpoint discovery.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::{NavigationOutcome, NavigationResult, Session};

// Driver types
pub use driver::{ChromeOptions, Driver, DriverBuilder, Readiness};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CommandId, SessionId};

// Protocol types
pub use protocol::Event;

// Transport types
pub use transport::{Connection, EventSubscription};
