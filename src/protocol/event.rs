//! Event message types.
//!
//! Events are unsolicited notifications sent by the browser when page or
//! network activity occurs. They carry no `id` and are addressed to no
//! particular command.
//!
//! # Events of Interest
//!
//! | Domain | Events |
//! |--------|--------|
//! | `Page` | `loadEventFired` |
//! | `Network` | `requestWillBeSent`, `responseReceived`, `loadingFinished`, `loadingFailed` |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Domain prefix of network events.
pub const NETWORK_DOMAIN: &str = "Network";

/// Fired when the page `load` event fires.
pub const PAGE_LOAD_EVENT_FIRED: &str = "Page.loadEventFired";

/// Fired when an HTTP request fails to load.
pub const NETWORK_LOADING_FAILED: &str = "Network.loadingFailed";

/// Resource type of a top-level or frame document.
pub const RESOURCE_TYPE_DOCUMENT: &str = "Document";

/// Request id suffix of the first request within a navigation.
const MAIN_DOCUMENT_REQUEST_SUFFIX: &str = ".1";

// ============================================================================
// Event
// ============================================================================

/// An event notification from the browser.
///
/// # Format
///
/// ```json
/// {
///   "method": "Domain.eventName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name in `Domain.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,
}

impl Event {
    /// Creates an event.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Returns the domain name from the method.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let event = Event::new("Page.loadEventFired", Value::Null);
    /// assert_eq!(event.domain(), "Page");
    /// ```
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.split('.').nth(1).unwrap_or_default()
    }

    /// Returns `true` if the method belongs to the `Network` topic.
    ///
    /// Matches on the raw prefix, so `NetworkFoo.bar` also counts.
    #[inline]
    #[must_use]
    pub fn is_network(&self) -> bool {
        self.method.starts_with(NETWORK_DOMAIN)
    }

    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        match self.method.as_str() {
            PAGE_LOAD_EVENT_FIRED => ParsedEvent::PageLoadEventFired {
                timestamp: self.params.get("timestamp").and_then(Value::as_f64),
            },

            NETWORK_LOADING_FAILED => ParsedEvent::NetworkLoadingFailed {
                request_id: self.get_string("requestId"),
                resource_type: self.get_string("type"),
                error_text: self.get_string("errorText"),
                canceled: self
                    .params
                    .get("canceled")
                    .and_then(Value::as_bool)
                    .unwrap_or_default(),
            },

            _ => ParsedEvent::Unknown {
                method: self.method.clone(),
            },
        }
    }

    /// Gets a string from params.
    #[inline]
    fn get_string(&self, key: &str) -> String {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Parsed event types for type-safe handling.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    /// The page `load` event fired.
    PageLoadEventFired {
        /// Monotonic browser timestamp, if present.
        timestamp: Option<f64>,
    },

    /// A request failed to load.
    NetworkLoadingFailed {
        /// Request identifier (`<loader>.<n>`).
        request_id: String,
        /// Resource type (`Document`, `Script`, ...).
        resource_type: String,
        /// Browser error text (`net::ERR_NAME_NOT_RESOLVED`, ...).
        error_text: String,
        /// Whether the request was canceled.
        canceled: bool,
    },

    /// Any other event.
    Unknown {
        /// Event method.
        method: String,
    },
}

impl ParsedEvent {
    /// Returns `true` if this is the failure of a navigation's main document.
    ///
    /// The main document is the first request of the navigation, whose id
    /// ends in `.1`.
    #[must_use]
    pub fn is_main_document_failure(&self) -> bool {
        match self {
            Self::NetworkLoadingFailed {
                request_id,
                resource_type,
                ..
            } => {
                resource_type == RESOURCE_TYPE_DOCUMENT
                    && request_id.ends_with(MAIN_DOCUMENT_REQUEST_SUFFIX)
            }
            _ => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_event_parsing() {
        let json_str = r#"{
            "method": "Page.loadEventFired",
            "params": { "timestamp": 1234.5 }
        }"#;

        let event: Event = serde_json::from_str(json_str).expect("parse event");
        assert_eq!(event.domain(), "Page");
        assert_eq!(event.event_name(), "loadEventFired");
        assert!(!event.is_network());

        match event.parse() {
            ParsedEvent::PageLoadEventFired { timestamp } => {
                assert_eq!(timestamp, Some(1234.5));
            }
            other => panic!("unexpected parsed event: {other:?}"),
        }
    }

    #[test]
    fn test_event_without_params() {
        let event: Event =
            serde_json::from_str(r#"{"method": "Page.frameStoppedLoading"}"#).expect("parse");
        assert_eq!(event.params, Value::Null);
    }

    #[test]
    fn test_main_document_failure() {
        let event = Event::new(
            NETWORK_LOADING_FAILED,
            json!({
                "requestId": "1000.1",
                "type": "Document",
                "errorText": "net::ERR_NAME_NOT_RESOLVED",
                "canceled": false
            }),
        );

        let parsed = event.parse();
        assert!(event.is_network());
        assert!(parsed.is_main_document_failure());
    }

    #[test]
    fn test_subresource_failure_is_not_terminal() {
        let image = Event::new(
            NETWORK_LOADING_FAILED,
            json!({ "requestId": "1000.1", "type": "Image" }),
        );
        assert!(!image.parse().is_main_document_failure());

        let iframe_doc = Event::new(
            NETWORK_LOADING_FAILED,
            json!({ "requestId": "1000.7", "type": "Document" }),
        );
        assert!(!iframe_doc.parse().is_main_document_failure());

        // ".10" ends with "0", not ".1"
        let tenth = Event::new(
            NETWORK_LOADING_FAILED,
            json!({ "requestId": "1000.10", "type": "Document" }),
        );
        assert!(!tenth.parse().is_main_document_failure());
    }

    #[test]
    fn test_unknown_event() {
        let event = Event::new("Network.requestWillBeSent", json!({ "requestId": "1.1" }));
        assert!(event.is_network());
        assert_eq!(
            event.parse(),
            ParsedEvent::Unknown {
                method: "Network.requestWillBeSent".to_string()
            }
        );
    }

    #[test]
    fn test_event_round_trip() {
        let event = Event::new("Network.dataReceived", json!({ "dataLength": 512 }));
        let text = serde_json::to_string(&event).expect("serialize");
        let back: Event = serde_json::from_str(&text).expect("parse");
        assert_eq!(back, event);
    }
}
