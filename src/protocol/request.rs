//! Request and Response message types.
//!
//! Defines the envelope of commands sent to the browser and of the replies
//! that answer them.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

use super::Command;

// ============================================================================
// Request
// ============================================================================

/// A command request from the client to the browser.
///
/// # Format
///
/// ```json
/// {
///   "id": 0,
///   "method": "Domain.methodName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Identifier for request/response correlation.
    pub id: CommandId,

    /// Method in `Domain.methodName` format.
    pub method: String,

    /// Method parameters (always an object on the wire).
    #[serde(default = "empty_params")]
    pub params: Value,
}

impl Request {
    /// Creates a request from a raw method and params.
    ///
    /// `Value::Null` params are sent as an empty object.
    #[must_use]
    pub fn new(id: CommandId, method: impl Into<String>, params: Value) -> Self {
        let params = if params.is_null() { empty_params() } else { params };
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Creates a request from a typed command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the command does not serialize to a
    /// `{method, params}` object.
    pub fn from_command(id: CommandId, command: &Command) -> Result<Self> {
        let value = serde_json::to_value(command)?;
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol("Command serialized without a method"))?
            .to_string();
        let params = value.get("params").cloned().unwrap_or(Value::Null);
        Ok(Self::new(id, method, params))
    }
}

/// Default params value.
fn empty_params() -> Value {
    Value::Object(Map::new())
}

// ============================================================================
// Response
// ============================================================================

/// A reply from the browser to one command.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": 0, "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "id": 0, "error": { "code": -32000, "message": "..." } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Matches the command `id`.
    pub id: CommandId,

    /// Result data (if success).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error object (if error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl Response {
    /// Creates a success response.
    #[inline]
    #[must_use]
    pub fn success(id: CommandId, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Extracts the result value, returning error if response was error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommandFailed`] if the response carried an error.
    pub fn into_result(self, method: &str) -> Result<Value> {
        match self.error {
            Some(err) => Err(Error::command_failed(method, err.code, err.message)),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

// ============================================================================
// ResponseError
// ============================================================================

/// Error object of a failed command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Protocol error code.
    pub code: i64,

    /// Human-readable message. Some peers omit it.
    #[serde(default)]
    pub message: String,

    /// Additional detail, of any shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ============================================================================
// Tests
// ============================================================================
