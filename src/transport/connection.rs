//! WebSocket connection and event loop.
//!
//! This module handles the WebSocket connection to one page target,
//! including request/response correlation and event routing.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that is the only reader of the socket.
//! It handles:
//!
//! - Incoming frames from the browser (responses, events)
//! - Outgoing commands from the Rust API
//! - Request/response correlation by [`CommandId`]
//! - Handing events to the single active [`EventSubscription`]
//!
//! Callers never read the socket themselves: a correlated call waits on a
//! oneshot slot keyed by its id, and an event waiter drains its subscription
//! channel. A frame nobody is waiting for is logged and dropped.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, to_string};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{CommandId, CommandIdAllocator};
use crate::protocol::{Command, Event, Incoming, Request, Response};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for a correlated command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum pending requests before rejecting new ones.
const MAX_PENDING_REQUESTS: usize = 100;

/// How long `close` waits for the event loop to finish.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Types
// ============================================================================

/// Map of command IDs to response channels.
type CorrelationMap = FxHashMap<CommandId, oneshot::Sender<Result<Response>>>;

/// The registered event consumer, if any.
struct EventSink {
    /// Identifies the subscription that owns this sink.
    token: u64,
    /// Delivery channel.
    tx: mpsc::UnboundedSender<Event>,
}

/// Shared event slot.
type EventSlot = Arc<Mutex<Option<EventSink>>>;

/// How the caller wants to hear about a sent request.
enum Reply {
    /// Wait for the correlated response.
    Response(oneshot::Sender<Result<Response>>),
    /// Only acknowledge that the frame was written.
    Written(oneshot::Sender<Result<()>>),
}

impl Reply {
    /// Fails the caller with the given error.
    fn fail(self, err: Error) {
        match self {
            Self::Response(tx) => {
                let _ = tx.send(Err(err));
            }
            Self::Written(tx) => {
                let _ = tx.send(Err(err));
            }
        }
    }
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write a request.
    Send { request: Request, reply: Reply },
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(CommandId),
    /// Shutdown the connection.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to one browser page target.
///
/// Owns the command id counter and the single reader of the inbound stream.
/// Cloning yields another handle to the same connection.
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
    /// Active event consumer (shared with event loop).
    events: EventSlot,
    /// Set by the event loop when it stops.
    closed: Arc<AtomicBool>,
    /// Command id source for this connection.
    ids: Arc<CommandIdAllocator>,
    /// Source of subscription tokens.
    next_token: Arc<AtomicU64>,
    /// Event loop task, taken by `close`.
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            correlation: Arc::clone(&self.correlation),
            events: Arc::clone(&self.events),
            closed: Arc::clone(&self.closed),
            ids: Arc::clone(&self.ids),
            next_token: Arc::clone(&self.next_token),
            task: Arc::clone(&self.task),
        }
    }
}

impl Connection {
    /// Connects to a debugger WebSocket URL.
    ///
    /// Message size limits are lifted: screenshot replies are large.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the handshake fails.
    pub async fn connect(ws_url: &str) -> Result<Self> {
        debug!(url = %ws_url, "Connecting to debugger endpoint");

        let config = WebSocketConfig::default()
            .max_message_size(None)
            .max_frame_size(None);

        let (ws_stream, _) =
            tokio_tungstenite::connect_async_with_config(ws_url, Some(config), false)
                .await
                .map_err(|e| Error::connection(format!("{ws_url}: {e}")))?;

        debug!(url = %ws_url, "Debugger connection established");
        Ok(Self::new(ws_stream))
    }

    /// Creates a new connection from a WebSocket stream.
    ///
    /// Spawns the event loop task internally.
    pub(crate) fn new<S>(ws_stream: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));
        let events: EventSlot = Arc::new(Mutex::new(None));
        let closed = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
            Arc::clone(&events),
            Arc::clone(&closed),
        ));

        Self {
            command_tx,
            correlation,
            events,
            closed,
            ids: Arc::new(CommandIdAllocator::new()),
            next_token: Arc::new(AtomicU64::new(0)),
            task: Arc::new(Mutex::new(Some(task))),
        }
    }

    // ========================================================================
    // Correlated Calls
    // ========================================================================

    /// Sends a command and waits for its result with the default timeout (30s).
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionLost`] if the connection closes before the reply
    /// - [`Error::CommandFailed`] if the browser answered with an error
    /// - [`Error::CommandTimeout`] if no reply arrives in time
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.call_with_timeout(method, params, DEFAULT_COMMAND_TIMEOUT)
            .await
    }

    /// Sends a command and waits for its result with a custom timeout.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::call`].
    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Value,
        call_timeout: Duration,
    ) -> Result<Value> {
        let request = Request::new(self.ids.next_id(), method, params);
        let response = self.round_trip(request, call_timeout).await?;
        response.into_result(method)
    }

    /// Sends a typed command and waits for its result.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::call`].
    pub async fn call_command(&self, command: &Command) -> Result<Value> {
        let request = Request::from_command(self.ids.next_id(), command)?;
        let method = request.method.clone();
        let response = self.round_trip(request, DEFAULT_COMMAND_TIMEOUT).await?;
        response.into_result(&method)
    }

    /// Writes a request and waits for the correlated response.
    async fn round_trip(&self, request: Request, request_timeout: Duration) -> Result<Response> {
        let request_id = request.id;
        let method = request.method.clone();

        // Check pending request limit
        {
            let correlation = self.correlation.lock();
            if correlation.len() >= MAX_PENDING_REQUESTS {
                warn!(
                    pending = correlation.len(),
                    max = MAX_PENDING_REQUESTS,
                    "Too many pending requests"
                );
                return Err(Error::protocol(format!(
                    "Too many pending requests: {}/{}",
                    correlation.len(),
                    MAX_PENDING_REQUESTS
                )));
            }
        }

        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send {
                request,
                reply: Reply::Response(response_tx),
            })
            .map_err(|_| Error::ConnectionLost)?;

        match timeout(request_timeout, response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionLost),
            Err(_) => {
                let _ = self
                    .command_tx
                    .send(ConnectionCommand::RemoveCorrelation(request_id));

                Err(Error::command_timeout(
                    request_id,
                    method,
                    request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    // ========================================================================
    // Fire-and-forget
    // ========================================================================

    /// Writes a command without waiting for its response.
    ///
    /// Resolves once the frame has been written. The eventual response is
    /// dropped by the event loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionLost`] if the frame could not be written.
    pub async fn send(&self, method: &str, params: Value) -> Result<CommandId> {
        let request = Request::new(self.ids.next_id(), method, params);
        self.write_only(request).await
    }

    /// Writes a typed command without waiting for its response.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::send`].
    pub async fn send_command(&self, command: &Command) -> Result<CommandId> {
        let request = Request::from_command(self.ids.next_id(), command)?;
        self.write_only(request).await
    }

    /// Hands a request to the event loop and waits for the write.
    async fn write_only(&self, request: Request) -> Result<CommandId> {
        let request_id = request.id;
        let (written_tx, written_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send {
                request,
                reply: Reply::Written(written_tx),
            })
            .map_err(|_| Error::ConnectionLost)?;

        written_rx.await.map_err(|_| Error::ConnectionLost)??;
        Ok(request_id)
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Registers the connection's single event consumer.
    ///
    /// Events that arrive while no subscription is active are dropped, so
    /// subscribe before issuing the command whose events you want.
    ///
    /// # Errors
    ///
    /// - [`Error::WaiterBusy`] if another subscription is active
    /// - [`Error::ConnectionLost`] if the connection is closed
    pub fn subscribe(&self) -> Result<EventSubscription> {
        let mut slot = self.events.lock();

        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::ConnectionLost);
        }

        if slot.as_ref().is_some_and(|sink| !sink.tx.is_closed()) {
            return Err(Error::WaiterBusy);
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        *slot = Some(EventSink { token, tx });

        trace!(token, "Event subscription registered");

        Ok(EventSubscription {
            rx,
            token,
            slot: Arc::clone(&self.events),
        })
    }

    /// Waits for the first event whose method equals `method`.
    ///
    /// Non-matching events seen meanwhile are discarded.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::subscribe`], plus [`Error::ConnectionLost`] if
    /// the connection closes while waiting.
    pub async fn wait_for_event(&self, method: &str) -> Result<Event> {
        let mut subscription = self.subscribe()?;
        subscription.wait_for(method).await
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Returns `true` once the event loop has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Asks the event loop to close the socket.
    ///
    /// Returns immediately; use [`Connection::close`] to wait.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Closes the socket and waits for the event loop to finish.
    pub async fn close(&self) {
        self.shutdown();

        let task = self.task.lock().take();
        if let Some(task) = task {
            match timeout(CLOSE_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(error = %e, "Event loop task failed"),
                Err(_) => debug!("Event loop did not stop in time"),
            }
        }
    }

    // ========================================================================
    // Event Loop
    // ========================================================================

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop<S>(
        ws_stream: WebSocketStream<S>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
        events: EventSlot,
        closed: Arc<AtomicBool>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming frames from the browser
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(&text, &correlation, &events);
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from Rust API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { request, reply }) => {
                            Self::handle_send_command(
                                request,
                                reply,
                                &mut ws_write,
                                &correlation,
                            ).await;
                        }

                        Some(ConnectionCommand::RemoveCorrelation(request_id)) => {
                            correlation.lock().remove(&request_id);
                            debug!(%request_id, "Removed timed-out correlation");
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        closed.store(true, Ordering::SeqCst);

        // Dropping the sink ends the active subscription
        events.lock().take();

        Self::fail_pending_requests(&correlation);

        debug!("Event loop terminated");
    }

    /// Routes one inbound text frame.
    fn handle_incoming_message(
        text: &str,
        correlation: &Arc<Mutex<CorrelationMap>>,
        events: &EventSlot,
    ) {
        match Incoming::parse(text) {
            Ok(Incoming::Response(response)) => {
                let tx = correlation.lock().remove(&response.id);

                if let Some(tx) = tx {
                    trace!(id = %response.id, "Response correlated");
                    let _ = tx.send(Ok(response));
                } else {
                    // Replies to fire-and-forget commands land here
                    debug!(id = %response.id, "Response with no waiter dropped");
                }
            }

            Ok(Incoming::Event(event)) => {
                let mut slot = events.lock();
                match slot.as_ref() {
                    Some(sink) => {
                        if let Err(mpsc::error::SendError(event)) = sink.tx.send(event) {
                            trace!(method = %event.method, "Subscriber gone, event dropped");
                            *slot = None;
                        }
                    }
                    None => {
                        trace!(method = %event.method, "No subscriber, event dropped");
                    }
                }
            }

            Err(e) => {
                warn!(error = %e, text = %text, "Failed to parse incoming message");

                let Some(id) = Incoming::frame_id(text) else {
                    return;
                };

                if let Some(tx) = correlation.lock().remove(&id) {
                    let _ = tx.send(Err(Error::protocol(format!(
                        "Malformed reply to command {id}: {e}"
                    ))));
                }
            }
        }
    }

    /// Handles a send command from the Rust API.
    async fn handle_send_command<S>(
        request: Request,
        reply: Reply,
        ws_write: &mut SplitSink<WebSocketStream<S>, Message>,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let request_id = request.id;

        let json = match to_string(&request) {
            Ok(j) => j,
            Err(e) => {
                reply.fail(Error::Json(e));
                return;
            }
        };

        // Store correlation before sending
        let written = match reply {
            Reply::Response(tx) => {
                correlation.lock().insert(request_id, tx);
                None
            }
            Reply::Written(tx) => Some(tx),
        };

        let outcome = ws_write.send(Message::Text(json.into())).await;

        if let Err(e) = &outcome {
            warn!(%request_id, method = %request.method, error = %e, "Failed to write request");
            if let Some(tx) = correlation.lock().remove(&request_id) {
                let _ = tx.send(Err(Error::ConnectionLost));
            }
        }

        if let Some(tx) = written {
            let _ = tx.send(outcome.map_err(|_| Error::ConnectionLost));
        }

        trace!(%request_id, method = %request.method, "Request sent");
    }

    /// Fails all pending requests with ConnectionLost.
    fn fail_pending_requests(correlation: &Arc<Mutex<CorrelationMap>>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::ConnectionLost));
        }

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
    }
}

// ============================================================================
// EventSubscription
// ============================================================================

/// The connection's active event consumer.
///
/// Receives every event in arrival order. Unregisters itself on drop, after
/// which the connection drops events until the next subscription.
pub struct EventSubscription {
    /// Delivery channel.
    rx: mpsc::UnboundedReceiver<Event>,
    /// Token matching the registered sink.
    token: u64,
    /// Slot to clear on drop.
    slot: EventSlot,
}

impl EventSubscription {
    /// Receives the next event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionLost`] if the connection has closed.
    pub async fn next(&mut self) -> Result<Event> {
        self.rx.recv().await.ok_or(Error::ConnectionLost)
    }

    /// Receives events until one whose method equals `method`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionLost`] if the connection has closed.
    pub async fn wait_for(&mut self, method: &str) -> Result<Event> {
        loop {
            let event = self.next().await?;
            if event.method == method {
                return Ok(event);
            }
            trace!(method = %event.method, wanted = %method, "Skipping event");
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|sink| sink.token == self.token) {
            *slot = None;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
