//! Debugger endpoint discovery.
//!
//! The browser serves a list of its targets over HTTP on the debugging
//! port. Each page target advertises the WebSocket URL to connect to.
//!
//! # Discovery Flow
//!
//! 1. `GET http://127.0.0.1:{port}/json`
//! 2. Pick the first target with `type == "page"` and a debugger URL
//! 3. If none, query once more
//! 4. Still none: [`Error::EndpointNotFound`]

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Per-request timeout for the metadata query.
const DISCOVERY_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Target type of a controllable page.
const PAGE_TARGET_TYPE: &str = "page";

// ============================================================================
// TargetInfo
// ============================================================================

/// One entry of the `/json` target list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    /// Target identifier.
    #[serde(default)]
    pub id: String,

    /// Target type (`page`, `background_page`, `service_worker`, ...).
    #[serde(rename = "type")]
    pub target_type: String,

    /// Page title.
    #[serde(default)]
    pub title: String,

    /// Current URL.
    #[serde(default)]
    pub url: String,

    /// WebSocket endpoint; absent while another client is attached.
    #[serde(default)]
    pub web_socket_debugger_url: Option<String>,
}

impl TargetInfo {
    /// Returns `true` if this is a page target.
    #[inline]
    #[must_use]
    pub fn is_page(&self) -> bool {
        self.target_type == PAGE_TARGET_TYPE
    }
}

/// Returns the debugger URL of the first page target, if any.
#[must_use]
pub fn select_page_endpoint(targets: &[TargetInfo]) -> Option<String> {
    let page = targets.iter().find(|t| t.is_page())?;
    page.web_socket_debugger_url.clone()
}

// ============================================================================
// Discovery
// ============================================================================

/// HTTP client for the browser's metadata endpoint.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// HTTP client.
    client: reqwest::Client,
    /// Debugging port.
    port: u16,
}

impl Discovery {
    /// Creates a discovery client for the given debugging port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(port: u16) -> Result<Self> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(DISCOVERY_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, port })
    }

    /// Returns the debugging port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the target list URL.
    #[inline]
    #[must_use]
    pub fn list_url(&self) -> String {
        format!("http://127.0.0.1:{}/json", self.port)
    }

    /// Fetches the current target list.
    ///
    /// # Errors
    ///
    /// - [`Error::Http`] if the request fails
    /// - [`Error::Discovery`] if the body is not a target list
    pub async fn targets(&self) -> Result<Vec<TargetInfo>> {
        let response = self
            .client
            .get(self.list_url())
            .send()
            .await?
            .error_for_status()?;

        let targets: Vec<TargetInfo> = response
            .json()
            .await
            .map_err(|e| Error::discovery(format!("Invalid target list: {e}")))?;

        debug!(port = self.port, count = targets.len(), "Fetched target list");
        Ok(targets)
    }

    /// Finds the debugger URL of the first page target.
    ///
    /// Queries once more if the first answer has no usable page target.
    ///
    /// # Errors
    ///
    /// - [`Error::EndpointNotFound`] if both queries come back without one
    /// - [`Error::Http`] / [`Error::Discovery`] if a query fails
    pub async fn page_endpoint(&self) -> Result<String> {
        for attempt in 1..=2 {
            let targets = self.targets().await?;

            if let Some(ws_url) = select_page_endpoint(&targets) {
                validate_ws_url(&ws_url)?;
                debug!(port = self.port, url = %ws_url, attempt, "Found page endpoint");
                return Ok(ws_url);
            }

            warn!(port = self.port, attempt, ?targets, "No page target with debugger URL");
        }

        Err(Error::endpoint_not_found(self.port))
    }
}

/// Checks that an advertised endpoint is a WebSocket URL.
fn validate_ws_url(ws_url: &str) -> Result<()> {
    let url = Url::parse(ws_url)
        .map_err(|e| Error::discovery(format!("Bad debugger URL {ws_url}: {e}")))?;

    match url.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(Error::discovery(format!(
            "Debugger URL has scheme {other}, expected ws"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const PAGE_LIST: &str = r#"[
        {
            "id": "BG",
            "type": "background_page",
            "title": "ext",
            "url": "chrome-extension://abc/bg.html",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/BG"
        },
        {
            "id": "P1",
            "type": "page",
            "title": "New Tab",
            "url": "about:blank",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/P1"
        }
    ]"#;

    /// Serves canned `/json` bodies, one per connection, repeating the last.
    async fn serve_bodies(bodies: Vec<&'static str>) -> (u16, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let body = bodies[n.min(bodies.len() - 1)];

                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let reply = format!(
                    "HTTP/1.1 200 OK\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(reply.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (port, hits)
    }

    #[test]
    fn test_select_first_page() {
        let targets: Vec<TargetInfo> = serde_json::from_str(PAGE_LIST).expect("parse");
        assert_eq!(
            select_page_endpoint(&targets).as_deref(),
            Some("ws://127.0.0.1:9222/devtools/page/P1")
        );
    }

    #[test]
    fn test_select_page_without_url() {
        let targets: Vec<TargetInfo> =
            serde_json::from_str(r#"[{"id": "P1", "type": "page"}]"#).expect("parse");
        assert_eq!(select_page_endpoint(&targets), None);
    }

    #[test]
    fn test_validate_ws_url() {
        assert!(validate_ws_url("ws://127.0.0.1:1/devtools/page/X").is_ok());
        assert!(validate_ws_url("http://127.0.0.1:1/").is_err());
        assert!(validate_ws_url("not a url").is_err());
    }

    #[tokio::test]
    async fn test_page_endpoint_found() {
        let (port, hits) = serve_bodies(vec![PAGE_LIST]).await;
        let discovery = Discovery::new(port).expect("client");

        let url = discovery.page_endpoint().await.expect("endpoint");
        assert_eq!(url, "ws://127.0.0.1:9222/devtools/page/P1");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_page_endpoint_retries_once() {
        let (port, hits) = serve_bodies(vec!["[]", PAGE_LIST]).await;
        let discovery = Discovery::new(port).expect("client");

        let url = discovery.page_endpoint().await.expect("endpoint");
        assert!(url.ends_with("/P1"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_endpoint_not_found_after_retry() {
        let (port, hits) = serve_bodies(vec![r#"[{"type": "service_worker"}]"#]).await;
        let discovery = Discovery::new(port).expect("client");

        let err = discovery.page_endpoint().await.unwrap_err();
        assert!(matches!(err, Error::EndpointNotFound { port: p } if p == port));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreachable_port_is_http_error() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let discovery = Discovery::new(port).expect("client");

        let err = discovery.targets().await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
