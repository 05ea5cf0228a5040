//! Scripted DevTools peer for tests.
//!
//! Accepts one WebSocket connection on a loopback port and answers every
//! request with whatever frames the script returns for it.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use crate::identifiers::CommandId;
use crate::protocol::Request;

// ============================================================================
// Script
// ============================================================================

/// What the peer does in answer to one request.
pub(crate) enum Script {
    /// Send these frames, in order.
    Frames(Vec<Value>),
    /// Close the connection.
    Close,
}

/// Builds a success reply.
pub(crate) fn ok_frame(id: CommandId, result: Value) -> Value {
    json!({ "id": id, "result": result })
}

/// Builds an event frame.
pub(crate) fn event_frame(method: &str, params: Value) -> Value {
    json!({ "method": method, "params": params })
}

// ============================================================================
// MockPeer
// ============================================================================

/// A scripted peer listening on `url`.
pub(crate) struct MockPeer {
    /// WebSocket URL to connect to.
    pub url: String,
    /// Requests received so far.
    received: Arc<Mutex<Vec<Request>>>,
}

impl MockPeer {
    /// Binds a listener and serves one connection with `script`.
    pub(crate) async fn spawn<F>(mut script: F) -> Self
    where
        F: FnMut(&Request) -> Script + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);

        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                return;
            };

            while let Some(Ok(message)) = ws.next().await {
                let Message::Text(text) = message else {
                    continue;
                };
                let Ok(request) = serde_json::from_str::<Request>(&text) else {
                    continue;
                };
                log.lock().push(request.clone());

                match script(&request) {
                    Script::Frames(frames) => {
                        for frame in frames {
                            if ws.send(Message::Text(frame.to_string().into())).await.is_err() {
                                return;
                            }
                        }
                    }
                    Script::Close => {
                        let _ = ws.close(None).await;
                        return;
                    }
                }
            }
        });

        Self {
            url: format!("ws://127.0.0.1:{port}"),
            received,
        }
    }

    /// Returns the requests received so far.
    pub(crate) fn received(&self) -> Vec<Request> {
        self.received.lock().clone()
    }
}
