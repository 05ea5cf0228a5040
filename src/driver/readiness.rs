//! Waiting for a freshly launched browser to expose its page target.
//!
//! Chrome opens its debugging port some time after the process starts. Two
//! policies are offered:
//!
//! | Policy | Behavior |
//! |--------|----------|
//! | [`Readiness::Settle`] | Sleep a fixed delay, then run discovery once (with its one retry) |
//! | [`Readiness::Poll`] | Retry discovery with exponential backoff until a deadline |
//!
//! The fixed delay is the historical behavior and races on slow machines;
//! polling is the default.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::transport::Discovery;

// ============================================================================
// Constants
// ============================================================================

/// Historical fixed delay between launch and discovery.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(8);

/// First poll interval.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Cap on the poll interval.
const DEFAULT_MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Give up polling after this long.
const DEFAULT_POLL_DEADLINE: Duration = Duration::from_secs(20);

// ============================================================================
// Readiness
// ============================================================================

/// How to wait for the browser's debugging endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Sleep a fixed delay, then discover.
    Settle(Duration),

    /// Poll discovery until it yields a page target.
    Poll {
        /// Delay before the second attempt; doubles after each failure.
        interval: Duration,
        /// Upper bound on the delay between attempts.
        max_interval: Duration,
        /// Total time budget.
        deadline: Duration,
    },
}

impl Default for Readiness {
    fn default() -> Self {
        Self::poll()
    }
}

impl Readiness {
    /// Polling with default intervals.
    #[inline]
    #[must_use]
    pub const fn poll() -> Self {
        Self::Poll {
            interval: DEFAULT_POLL_INTERVAL,
            max_interval: DEFAULT_MAX_POLL_INTERVAL,
            deadline: DEFAULT_POLL_DEADLINE,
        }
    }

    /// The historical fixed settle delay.
    #[inline]
    #[must_use]
    pub const fn settle() -> Self {
        Self::Settle(DEFAULT_SETTLE_DELAY)
    }

    /// Waits until discovery yields a page endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::EndpointNotFound`] if the budget is exhausted
    /// - Any discovery error under [`Readiness::Settle`]
    pub async fn wait_for_endpoint(&self, discovery: &Discovery) -> Result<String> {
        match *self {
            Self::Settle(delay) => {
                debug!(delay_ms = delay.as_millis() as u64, "Waiting settle delay");
                sleep(delay).await;
                discovery.page_endpoint().await
            }

            Self::Poll {
                interval,
                max_interval,
                deadline,
            } => Self::poll_endpoint(discovery, interval, max_interval, deadline).await,
        }
    }

    /// Retries discovery with backoff until success or deadline.
    async fn poll_endpoint(
        discovery: &Discovery,
        mut interval: Duration,
        max_interval: Duration,
        deadline: Duration,
    ) -> Result<String> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            let error = match discovery.page_endpoint().await {
                Ok(ws_url) => {
                    debug!(
                        attempts,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Debugging endpoint ready"
                    );
                    return Ok(ws_url);
                }
                Err(e) => e,
            };

            let elapsed = started.elapsed();
            if elapsed + interval > deadline {
                warn!(
                    attempts,
                    port = discovery.port(),
                    error = %error,
                    "Debugging endpoint not ready before deadline"
                );
                return Err(Error::endpoint_not_found(discovery.port()));
            }

            debug!(
                attempts,
                error = %error,
                retry_in_ms = interval.as_millis() as u64,
                "Endpoint not ready"
            );
            sleep(interval).await;
            interval = (interval * 2).min(max_interval);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const PAGE_LIST: &str =
        r#"[{"type": "page", "webSocketDebuggerUrl": "ws://127.0.0.1:1/devtools/page/A"}]"#;

    /// Reserves a port and starts serving the page list on it after `delay`.
    async fn serve_later(delay: Duration) -> u16 {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            listener.local_addr().expect("addr").port()
        };

        tokio::spawn(async move {
            sleep(delay).await;
            let listener = TcpListener::bind(("127.0.0.1", port)).await.expect("rebind");
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let reply = format!(
                    "HTTP/1.1 200 OK\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{}",
                    PAGE_LIST.len(),
                    PAGE_LIST
                );
                let _ = stream.write_all(reply.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        port
    }

    #[test]
    fn test_default_is_poll() {
        assert!(matches!(Readiness::default(), Readiness::Poll { .. }));
        assert_eq!(Readiness::settle(), Readiness::Settle(Duration::from_secs(8)));
    }

    #[tokio::test]
    async fn test_poll_waits_for_late_endpoint() {
        let port = serve_later(Duration::from_millis(300)).await;
        let discovery = Discovery::new(port).expect("client");

        let readiness = Readiness::Poll {
            interval: Duration::from_millis(50),
            max_interval: Duration::from_millis(100),
            deadline: Duration::from_secs(5),
        };

        let url = readiness.wait_for_endpoint(&discovery).await.expect("endpoint");
        assert!(url.ends_with("/A"));
    }

    #[tokio::test]
    async fn test_poll_gives_up_at_deadline() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let discovery = Discovery::new(port).expect("client");

        let readiness = Readiness::Poll {
            interval: Duration::from_millis(20),
            max_interval: Duration::from_millis(40),
            deadline: Duration::from_millis(200),
        };

        let err = readiness.wait_for_endpoint(&discovery).await.unwrap_err();
        assert!(matches!(err, Error::EndpointNotFound { .. }));
    }

    #[tokio::test]
    async fn test_settle_then_discover() {
        let port = serve_later(Duration::ZERO).await;
        let discovery = Discovery::new(port).expect("client");

        let url = Readiness::Settle(Duration::from_millis(100))
            .wait_for_endpoint(&discovery)
            .await
            .expect("endpoint");
        assert!(url.ends_with("/A"));
    }
}
