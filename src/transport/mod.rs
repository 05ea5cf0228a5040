//! WebSocket transport layer.
//!
//! This module handles communication between the client (Rust) and one
//! browser page target over the DevTools WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │ Session (Rust)  │      HTTP GET /json          │  Browser        │
//! │                 │─────────────────────────────►│                 │
//! │  Discovery      │                              │  Debugging      │
//! │  → Connection   │◄────────────────────────────►│  port           │
//! │                 │  ws://127.0.0.1:PORT/...     │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Discovery::page_endpoint` - Find the page target's WebSocket URL
//! 2. `Connection::connect` - Handshake and spawn the event loop
//! 3. `Connection::call` / `send` / `subscribe` - Commands and events
//! 4. `Connection::close` - Close the socket and join the event loop
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `discovery` | Debugger endpoint discovery over HTTP |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// Debugger endpoint discovery.
pub mod discovery;

/// Scripted peer for tests.
#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, DEFAULT_COMMAND_TIMEOUT, EventSubscription};
pub use discovery::{Discovery, TargetInfo};
