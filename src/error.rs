//! Error types for chrome-recorder.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use chrome_recorder::{Driver, Result};
//!
//! async fn example(driver: &Driver) -> Result<()> {
//!     let result = driver.record_navigation("https://example.com").await?;
//!     if result.timed_out {
//!         println!("no screenshot, {} network events", result.network_events.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::BrowserNotFound`], [`Error::InvalidArgument`] |
//! | Lifecycle | [`Error::ProcessLaunchFailed`], [`Error::Discovery`], [`Error::EndpointNotFound`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionLost`] |
//! | Protocol | [`Error::Protocol`], [`Error::CommandFailed`], [`Error::CommandTimeout`], [`Error::ProtocolEnableFailed`], [`Error::WaiterBusy`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Http`], [`Error::Base64`] |
//!
//! A navigation that runs out of time is not an error: it is reported through
//! [`NavigationResult::timed_out`](crate::NavigationResult::timed_out).

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use base64::DecodeError;
use thiserror::Error;

use crate::identifiers::CommandId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when driver configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Browser binary not found at path.
    #[error("Browser not found at: {path}")]
    BrowserNotFound {
        /// Path where the browser was expected.
        path: PathBuf,
    },

    /// Invalid argument passed to an operation.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Failed to launch the browser process.
    #[error("Failed to launch browser: {message}")]
    ProcessLaunchFailed {
        /// Description of the launch failure.
        message: String,
    },

    /// The metadata endpoint could not be queried or parsed.
    #[error("Target discovery failed: {message}")]
    Discovery {
        /// Description of the discovery failure.
        message: String,
    },

    /// No page target with a debugger URL after retrying discovery.
    ///
    /// Fatal to session start.
    #[error("No page target with a debugger endpoint on port {port}")]
    EndpointNotFound {
        /// Debugging port that was queried.
        port: u16,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection could not be established.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection closed or errored while a call or wait was in flight.
    ///
    /// Fatal to the in-flight call; no retry is attempted.
    #[error("Connection lost")]
    ConnectionLost,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected reply shape.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// The remote end answered a command with an error object.
    #[error("{method} failed ({code}): {message}")]
    CommandFailed {
        /// Method of the failed command.
        method: String,
        /// Protocol error code.
        code: i64,
        /// Protocol error message.
        message: String,
    },

    /// No reply to a command within its timeout.
    #[error("Command {id} ({method}) timed out after {timeout_ms}ms")]
    CommandTimeout {
        /// Identifier of the command.
        id: CommandId,
        /// Method of the command.
        method: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Enabling an observation domain failed; navigation cannot proceed.
    #[error("Failed to enable {domain} domain: {reason}")]
    ProtocolEnableFailed {
        /// Domain that could not be enabled (`Network`, `Page`).
        domain: String,
        /// Underlying failure.
        reason: String,
    },

    /// Another event waiter is already consuming this connection's events.
    #[error("An event waiter is already active on this connection")]
    WaiterBusy,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error from the discovery endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Screenshot payload was not valid base64.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] DecodeError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a browser not found error.
    #[inline]
    pub fn browser_not_found(path: impl Into<PathBuf>) -> Self {
        Self::BrowserNotFound { path: path.into() }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a process launch failed error.
    #[inline]
    pub fn process_launch_failed(err: IoError) -> Self {
        Self::ProcessLaunchFailed {
            message: err.to_string(),
        }
    }

    /// Creates a discovery error.
    #[inline]
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            message: message.into(),
        }
    }

    /// Creates an endpoint not found error.
    #[inline]
    pub fn endpoint_not_found(port: u16) -> Self {
        Self::EndpointNotFound { port }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a command failed error.
    #[inline]
    pub fn command_failed(
        method: impl Into<String>,
        code: i64,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            method: method.into(),
            code,
            message: message.into(),
        }
    }

    /// Creates a command timeout error.
    #[inline]
    pub fn command_timeout(id: CommandId, method: impl Into<String>, timeout_ms: u64) -> Self {
        Self::CommandTimeout {
            id,
            method: method.into(),
            timeout_ms,
        }
    }

    /// Creates a domain enable failure from the underlying error.
    #[inline]
    pub fn enable_failed(domain: impl Into<String>, source: &Error) -> Self {
        Self::ProtocolEnableFailed {
            domain: domain.into(),
            reason: source.to_string(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::CommandTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::ConnectionLost)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_command_failed_display() {
        let err = Error::command_failed("Page.navigate", -32602, "Invalid parameters");
        assert_eq!(
            err.to_string(),
            "Page.navigate failed (-32602): Invalid parameters"
        );
    }

    #[test]
    fn test_enable_failed_keeps_reason() {
        let inner = Error::command_failed("Network.enable", -32000, "Not allowed");
        let err = Error::enable_failed("Network", &inner);
        assert!(err.to_string().contains("Network domain"));
        assert!(err.to_string().contains("Not allowed"));
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::command_timeout(CommandId::new(3), "Page.enable", 1000);
        assert!(timeout_err.is_timeout());
        assert!(!Error::ConnectionLost.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::ConnectionLost.is_connection_error());
        assert!(Error::connection("x").is_connection_error());
        assert!(!Error::config("x").is_connection_error());
    }

    #[test]
    fn test_endpoint_not_found_names_port() {
        let err = Error::endpoint_not_found(9222);
        assert!(err.to_string().contains("9222"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
