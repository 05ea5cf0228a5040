//! Classification of inbound frames.
//!
//! Every text frame from the browser is either a [`Response`] (it has an
//! `id`) or an [`Event`] (it has a `method` and no `id`).

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

use super::{Event, Response};

// ============================================================================
// Incoming
// ============================================================================

/// One parsed inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// Reply to a command.
    Response(Response),
    /// Unsolicited notification.
    Event(Event),
}

impl Incoming {
    /// Parses a text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the frame is not a valid response or event
    /// - [`Error::Protocol`] if the frame has neither `id` nor `method`
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Classifies an already-decoded frame.
    ///
    /// # Errors
    ///
    /// Same as [`Incoming::parse`].
    pub fn from_value(value: Value) -> Result<Self> {
        if value.get("id").is_some() {
            return Ok(Self::Response(serde_json::from_value(value)?));
        }

        if value.get("method").is_some() {
            return Ok(Self::Event(serde_json::from_value(value)?));
        }

        Err(Error::protocol("Frame has neither id nor method"))
    }

    /// Reads the `id` of a frame that may not decode as a [`Response`].
    ///
    /// Used to fail the matching call when a reply is malformed.
    #[must_use]
    pub fn frame_id(text: &str) -> Option<CommandId> {
        let value: Value = serde_json::from_str(text).ok()?;
        value.get("id").and_then(Value::as_u64).map(CommandId::new)
    }

    /// Returns the event method, if this frame is an event.
    #[inline]
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Event(event) => Some(&event.method),
            Self::Response(_) => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
