//! DevTools protocol message types.
//!
//! This module defines the wire envelope exchanged with the browser over the
//! debugger WebSocket.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Client → Browser | Numbered command |
//! | `Response` | Browser → Client | Reply to one command (`result` or `error`) |
//! | `Event` | Browser → Client | Unsolicited notification, no `id` |
//!
//! # Command Naming
//!
//! Commands and events follow `Domain.methodName` format:
//!
//! - `Page.navigate`
//! - `Network.enable`
//! - `Network.loadingFailed`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command definitions by domain |
//! | `event` | Event type and typed parsing |
//! | `incoming` | Inbound frame classification |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by domain.
pub mod command;

/// Event message types.
pub mod event;

/// Inbound frame classification.
pub mod incoming;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, NetworkCommand, PageCommand};
pub use event::{
    Event, NETWORK_DOMAIN, NETWORK_LOADING_FAILED, PAGE_LOAD_EVENT_FIRED, ParsedEvent,
    RESOURCE_TYPE_DOCUMENT,
};
pub use incoming::Incoming;
pub use request::{Request, Response, ResponseError};
