//! Command definitions organized by domain.
//!
//! Commands follow the `Domain.methodName` format.
//!
//! # Command Domains
//!
//! | Domain | Commands |
//! |--------|----------|
//! | `Network` | `enable`, `disable` |
//! | `Page` | `enable`, `disable`, `navigate`, `captureScreenshot` |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by domain.
///
/// This enum wraps domain-specific command enums for unified serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    /// Network domain commands.
    Network(NetworkCommand),
    /// Page domain commands.
    Page(PageCommand),
}

// ============================================================================
// Network Commands
// ============================================================================

/// Network domain commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum NetworkCommand {
    /// Start emitting network events.
    #[serde(rename = "Network.enable")]
    Enable {},

    /// Stop emitting network events.
    #[serde(rename = "Network.disable")]
    Disable {},
}

// ============================================================================
// Page Commands
// ============================================================================

/// Page domain commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum PageCommand {
    /// Start emitting page events.
    #[serde(rename = "Page.enable")]
    Enable {},

    /// Stop emitting page events.
    #[serde(rename = "Page.disable")]
    Disable {},

    /// Navigate the page to a URL.
    #[serde(rename = "Page.navigate")]
    Navigate {
        /// URL to navigate to.
        url: String,
    },

    /// Capture the visible viewport.
    #[serde(rename = "Page.captureScreenshot")]
    CaptureScreenshot {
        /// Image format. Chrome defaults to `png`.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        format: Option<String>,
    },
}

// ============================================================================
// Tests
// ============================================================================
