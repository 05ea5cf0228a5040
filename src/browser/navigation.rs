//! Recorded navigation: load a URL, collect its network events, screenshot it.
//!
//! # Sequence
//!
//! | Step | Action |
//! |------|--------|
//! | Enable | `Network.enable` then `Page.enable`, both awaited |
//! | Navigate | Subscribe to events, then send `Page.navigate` without awaiting the reply |
//! | Collect | Keep every `Network*` event until a terminal event |
//! | Capture | `Page.captureScreenshot`, base64-decoded |
//!
//! Terminal events:
//! - `Page.loadEventFired`
//! - `Network.loadingFailed` for a `Document` whose request id ends in `.1`
//!   (the navigation's main document)
//!
//! If neither arrives within the time limit the result is returned with
//! `timed_out` set, no screenshot, and the events collected so far.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{Event, ParsedEvent};
use crate::transport::EventSubscription;

use super::Session;

// ============================================================================
// NavigationOutcome
// ============================================================================

/// How a recorded navigation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The page's `load` event fired.
    LoadFired,

    /// The main document failed to load.
    DocumentFailed {
        /// Request id of the failed document.
        request_id: String,
        /// Browser error text, e.g. `net::ERR_NAME_NOT_RESOLVED`.
        error_text: String,
    },

    /// Neither happened within the time limit.
    TimedOut,
}

// ============================================================================
// NavigationResult
// ============================================================================

/// Everything observed during one recorded navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationResult {
    /// `Network*` events in arrival order.
    pub network_events: Vec<Event>,

    /// Decoded screenshot, absent on timeout.
    pub screenshot: Option<Vec<u8>>,

    /// `true` if no terminal event arrived in time.
    pub timed_out: bool,

    /// How the navigation ended.
    pub outcome: NavigationOutcome,
}

impl NavigationResult {
    /// Builds the result of a navigation that ran out of time.
    fn timed_out(network_events: Vec<Event>) -> Self {
        Self {
            network_events,
            screenshot: None,
            timed_out: true,
            outcome: NavigationOutcome::TimedOut,
        }
    }
}

// ============================================================================
// Session - Recorded Navigation
// ============================================================================

impl Session {
    /// Navigates to `url` and records what happens, bounded by `limit`.
    ///
    /// The limit covers navigation and event collection, not enabling the
    /// domains or capturing the screenshot.
    ///
    /// # Errors
    ///
    /// - [`Error::ProtocolEnableFailed`] if either domain cannot be enabled
    /// - [`Error::WaiterBusy`] if another event subscription is active
    /// - [`Error::ConnectionLost`] if the connection drops before completion
    /// - [`Error::Base64`] / [`Error::Protocol`] if the screenshot reply is malformed
    pub async fn record_navigation(&self, url: &str, limit: Duration) -> Result<NavigationResult> {
        info!(session_id = %self.id(), %url, "Recording navigation");

        self.enable_network()
            .await
            .map_err(|e| Error::enable_failed("Network", &e))?;
        self.enable_page()
            .await
            .map_err(|e| Error::enable_failed("Page", &e))?;

        let mut network_events = Vec::new();
        let mut subscription = self.connection().subscribe()?;

        let navigation = async {
            self.navigate(url).await?;
            collect_until_terminal(&mut subscription, &mut network_events).await
        };

        let finished = timeout(limit, navigation).await;
        let outcome = match finished {
            Ok(outcome) => outcome?,
            Err(_) => {
                warn!(
                    session_id = %self.id(),
                    %url,
                    limit_ms = limit.as_millis() as u64,
                    events = network_events.len(),
                    "Navigation timed out"
                );
                return Ok(NavigationResult::timed_out(network_events));
            }
        };

        drop(subscription);

        let screenshot = self.capture_screenshot().await?;

        info!(
            session_id = %self.id(),
            %url,
            ?outcome,
            events = network_events.len(),
            screenshot_bytes = screenshot.len(),
            "Navigation recorded"
        );

        Ok(NavigationResult {
            network_events,
            screenshot: Some(screenshot),
            timed_out: false,
            outcome,
        })
    }
}

// ============================================================================
// Event Collection
// ============================================================================

/// Consumes events until a terminal one, keeping `Network*` events.
///
/// Terminal network events are kept before returning.
async fn collect_until_terminal(
    subscription: &mut EventSubscription,
    network_events: &mut Vec<Event>,
) -> Result<NavigationOutcome> {
    loop {
        let event = subscription.next().await?;

        if let Some(outcome) = terminal_outcome(&event) {
            debug!(method = %event.method, ?outcome, "Terminal event");
            if event.is_network() {
                network_events.push(event);
            }
            return Ok(outcome);
        }

        if event.is_network() {
            trace!(method = %event.method, "Collected network event");
            network_events.push(event);
        }
    }
}

/// Returns the outcome if `event` ends the navigation.
fn terminal_outcome(event: &Event) -> Option<NavigationOutcome> {
    match event.parse() {
        ParsedEvent::PageLoadEventFired { .. } => Some(NavigationOutcome::LoadFired),

        parsed if parsed.is_main_document_failure() => match parsed {
            ParsedEvent::NetworkLoadingFailed {
                request_id,
                error_text,
                ..
            } => Some(NavigationOutcome::DocumentFailed {
                request_id,
                error_text,
            }),
            _ => None,
        },

        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as Base64Standard;
    use serde_json::{Value, json};

    use crate::protocol::Request;
    use crate::transport::mock::{MockPeer, Script, event_frame, ok_frame};

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    fn screenshot_reply(request: &Request) -> Script {
        let data = Base64Standard.encode(PNG_BYTES);
        Script::Frames(vec![ok_frame(request.id, json!({ "data": data }))])
    }

    /// A peer that acks everything and answers `Page.navigate` with `events`.
    async fn navigation_peer(events: Vec<Value>) -> MockPeer {
        MockPeer::spawn(move |request| match request.method.as_str() {
            "Page.navigate" => {
                let mut frames = vec![ok_frame(request.id, json!({ "frameId": "F1" }))];
                frames.extend(events.iter().cloned());
                Script::Frames(frames)
            }
            "Page.captureScreenshot" => screenshot_reply(request),
            _ => Script::Frames(vec![ok_frame(request.id, json!({}))]),
        })
        .await
    }

    fn request_will_be_sent(id: &str) -> Value {
        event_frame(
            "Network.requestWillBeSent",
            json!({ "requestId": id, "type": "Document" }),
        )
    }

    #[test]
    fn test_terminal_outcome() {
        let load = Event::new("Page.loadEventFired", json!({ "timestamp": 3.0 }));
        assert_eq!(terminal_outcome(&load), Some(NavigationOutcome::LoadFired));

        let main_failed = Event::new(
            "Network.loadingFailed",
            json!({ "requestId": "1000.1", "type": "Document", "errorText": "net::ERR_FAILED" }),
        );
        assert_eq!(
            terminal_outcome(&main_failed),
            Some(NavigationOutcome::DocumentFailed {
                request_id: "1000.1".to_string(),
                error_text: "net::ERR_FAILED".to_string(),
            })
        );

        let subresource_failed = Event::new(
            "Network.loadingFailed",
            json!({ "requestId": "1000.7", "type": "Image" }),
        );
        assert_eq!(terminal_outcome(&subresource_failed), None);

        let other_document = Event::new(
            "Network.loadingFailed",
            json!({ "requestId": "1000.2", "type": "Document" }),
        );
        assert_eq!(terminal_outcome(&other_document), None);
    }

    #[tokio::test]
    async fn test_load_fired_completes_with_screenshot() {
        let peer = navigation_peer(vec![
            request_will_be_sent("1000.1"),
            event_frame("Page.frameNavigated", json!({})),
            event_frame("Network.responseReceived", json!({ "requestId": "1000.1" })),
            event_frame("Network.loadingFinished", json!({ "requestId": "1000.1" })),
            event_frame("Page.loadEventFired", json!({ "timestamp": 10.0 })),
        ])
        .await;

        let session = Session::attach(&peer.url).await.expect("attach");
        let result = session
            .record_navigation("https://example.com/", Duration::from_secs(5))
            .await
            .expect("navigation");

        assert!(!result.timed_out);
        assert_eq!(result.outcome, NavigationOutcome::LoadFired);
        assert_eq!(result.screenshot.as_deref(), Some(PNG_BYTES));

        let methods: Vec<&str> = result.network_events.iter().map(|e| e.method.as_str()).collect();
        assert_eq!(
            methods,
            vec![
                "Network.requestWillBeSent",
                "Network.responseReceived",
                "Network.loadingFinished"
            ]
        );

        let sent: Vec<String> = peer.received().into_iter().map(|r| r.method).collect();
        assert_eq!(
            sent,
            vec![
                "Network.enable",
                "Page.enable",
                "Page.navigate",
                "Page.captureScreenshot"
            ]
        );

        session.close().await;
    }

    #[tokio::test]
    async fn test_main_document_failure_completes() {
        // Unreachable host: the main document fails, no load event follows
        let peer = navigation_peer(vec![
            request_will_be_sent("2000.1"),
            event_frame(
                "Network.loadingFailed",
                json!({
                    "requestId": "2000.1",
                    "type": "Document",
                    "errorText": "net::ERR_NAME_NOT_RESOLVED",
                    "canceled": false
                }),
            ),
        ])
        .await;

        let session = Session::attach(&peer.url).await.expect("attach");
        let result = session
            .record_navigation("http://unreachable.invalid/", Duration::from_secs(5))
            .await
            .expect("navigation");

        assert!(!result.timed_out);
        assert!(result.screenshot.is_some());
        assert_eq!(
            result.outcome,
            NavigationOutcome::DocumentFailed {
                request_id: "2000.1".to_string(),
                error_text: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }
        );

        let last = result.network_events.last().expect("failure recorded");
        assert_eq!(last.method, "Network.loadingFailed");
        assert_eq!(last.params["requestId"], "2000.1");

        session.close().await;
    }

    #[tokio::test]
    async fn test_not_found_page_still_fires_load() {
        // A 404 is a normal response followed by a load event
        let peer = navigation_peer(vec![
            request_will_be_sent("3000.1"),
            event_frame(
                "Network.responseReceived",
                json!({ "requestId": "3000.1", "response": { "status": 404 } }),
            ),
            event_frame("Page.loadEventFired", json!({})),
        ])
        .await;

        let session = Session::attach(&peer.url).await.expect("attach");
        let result = session
            .record_navigation("https://example.com/missing", Duration::from_secs(5))
            .await
            .expect("navigation");

        assert!(!result.timed_out);
        assert!(result.screenshot.is_some());
        assert_eq!(result.network_events[1].params["response"]["status"], 404);

        session.close().await;
    }

    #[tokio::test]
    async fn test_timeout_returns_partial_events() {
        // Unresponsive server: the request starts but nothing finishes
        let peer = navigation_peer(vec![
            request_will_be_sent("4000.1"),
            event_frame("Page.frameStartedLoading", json!({})),
        ])
        .await;

        let session = Session::attach(&peer.url).await.expect("attach");
        let result = session
            .record_navigation("http://10.255.255.1/", Duration::from_millis(300))
            .await
            .expect("timeout is not an error");

        assert!(result.timed_out);
        assert_eq!(result.outcome, NavigationOutcome::TimedOut);
        assert!(result.screenshot.is_none());
        assert_eq!(result.network_events.len(), 1);
        assert_eq!(result.network_events[0].method, "Network.requestWillBeSent");

        assert!(
            !peer
                .received()
                .iter()
                .any(|r| r.method == "Page.captureScreenshot")
        );

        // Connection remains usable and the subscription slot is free again
        assert!(!session.connection().is_closed());
        assert!(session.connection().subscribe().is_ok());

        session.close().await;
    }

    #[tokio::test]
    async fn test_subresource_failure_is_not_terminal() {
        let peer = navigation_peer(vec![
            request_will_be_sent("5000.1"),
            event_frame(
                "Network.loadingFailed",
                json!({ "requestId": "5000.4", "type": "Script", "errorText": "net::ERR_BLOCKED" }),
            ),
            event_frame(
                "Network.loadingFailed",
                json!({ "requestId": "6000.1", "type": "XHR" }),
            ),
            event_frame("Page.loadEventFired", json!({})),
        ])
        .await;

        let session = Session::attach(&peer.url).await.expect("attach");
        let result = session
            .record_navigation("https://example.com/", Duration::from_secs(5))
            .await
            .expect("navigation");

        assert_eq!(result.outcome, NavigationOutcome::LoadFired);
        assert_eq!(result.network_events.len(), 3);
        assert!(result.network_events.iter().all(Event::is_network));

        session.close().await;
    }

    #[tokio::test]
    async fn test_enable_failure_aborts() {
        let peer = MockPeer::spawn(|request| match request.method.as_str() {
            "Page.enable" => Script::Frames(vec![json!({
                "id": request.id,
                "error": { "code": -32000, "message": "Not allowed" }
            })]),
            _ => Script::Frames(vec![ok_frame(request.id, json!({}))]),
        })
        .await;

        let session = Session::attach(&peer.url).await.expect("attach");
        let err = session
            .record_navigation("https://example.com/", Duration::from_secs(5))
            .await
            .unwrap_err();

        match err {
            Error::ProtocolEnableFailed { domain, reason } => {
                assert_eq!(domain, "Page");
                assert!(reason.contains("Not allowed"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(!peer.received().iter().any(|r| r.method == "Page.navigate"));
        session.close().await;
    }

    #[tokio::test]
    async fn test_connection_lost_while_navigating() {
        let peer = MockPeer::spawn(|request| match request.method.as_str() {
            "Page.navigate" => Script::Close,
            _ => Script::Frames(vec![ok_frame(request.id, json!({}))]),
        })
        .await;

        let session = Session::attach(&peer.url).await.expect("attach");
        let err = session
            .record_navigation("https://example.com/", Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ConnectionLost));
        session.close().await;
    }
}
