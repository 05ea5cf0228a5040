//! A live debugging session on one page target.
//!
//! Each [`Session`] owns:
//! - One debugger connection (and with it the command id counter)
//! - One Chrome process, when launched by a [`Driver`](crate::Driver)
//! - One temporary user-data directory, likewise
//!
//! [`Session::close`] releases all three. If a session is dropped without
//! closing, the process and directory guards still clean up.
//!
//! # Example
//!
//! ```no_run
//! use chrome_recorder::Driver;
//!
//! # async fn example() -> chrome_recorder::Result<()> {
//! let driver = Driver::builder().build()?;
//! let session = driver.launch().await?;
//!
//! session.enable_page().await?;
//! session.navigate("https://example.com").await?;
//! session.wait_for_event("Page.loadEventFired").await?;
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tracing::{debug, info};

use crate::driver::{BrowserProcess, UserDataDir};
use crate::error::Result;
use crate::identifiers::{CommandId, SessionId};
use crate::protocol::{Command, Event, NetworkCommand, PageCommand};
use crate::transport::Connection;

// ============================================================================
// Session
// ============================================================================

/// A connected page target and the resources backing it.
pub struct Session {
    /// Session identifier for logs.
    id: SessionId,
    /// Debugger connection.
    connection: Connection,
    /// Browser process, if this session launched one.
    process: Option<BrowserProcess>,
    /// User-data directory, if this session created one.
    user_data: Option<UserDataDir>,
    /// Debugging port, if known.
    port: Option<u16>,
}

// ============================================================================
// Session - Display
// ============================================================================

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("port", &self.port)
            .field("pid", &self.process.as_ref().map(BrowserProcess::pid))
            .field("closed", &self.connection.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Constructors
// ============================================================================

impl Session {
    /// Wraps the resources of a launched browser.
    pub(crate) fn new(
        connection: Connection,
        process: BrowserProcess,
        user_data: UserDataDir,
        port: u16,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            connection,
            process: Some(process),
            user_data: Some(user_data),
            port: Some(port),
        }
    }

    /// Connects to an already running page target.
    ///
    /// The session owns no process or directory; closing it only closes the
    /// connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`](crate::Error::Connection) if the
    /// handshake fails.
    pub async fn attach(ws_url: &str) -> Result<Self> {
        let connection = Connection::connect(ws_url).await?;
        let id = SessionId::generate();
        debug!(session_id = %id, url = %ws_url, "Attached to page target");

        Ok(Self {
            id,
            connection,
            process: None,
            user_data: None,
            port: None,
        })
    }
}

// ============================================================================
// Session - Accessors
// ============================================================================

impl Session {
    /// Returns the session identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the debugger connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Returns the debugging port, if this session launched the browser.
    #[inline]
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Returns the browser process ID, if this session launched the browser.
    #[inline]
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(BrowserProcess::pid)
    }
}

// ============================================================================
// Session - Domains
// ============================================================================

impl Session {
    /// Enables `Network.*` events.
    ///
    /// # Errors
    ///
    /// Returns the call's error if the browser rejects the command.
    pub async fn enable_network(&self) -> Result<()> {
        self.run(Command::Network(NetworkCommand::Enable {})).await
    }

    /// Disables `Network.*` events.
    ///
    /// # Errors
    ///
    /// Returns the call's error if the browser rejects the command.
    pub async fn disable_network(&self) -> Result<()> {
        self.run(Command::Network(NetworkCommand::Disable {})).await
    }

    /// Enables `Page.*` events.
    ///
    /// # Errors
    ///
    /// Returns the call's error if the browser rejects the command.
    pub async fn enable_page(&self) -> Result<()> {
        self.run(Command::Page(PageCommand::Enable {})).await
    }

    /// Disables `Page.*` events.
    ///
    /// # Errors
    ///
    /// Returns the call's error if the browser rejects the command.
    pub async fn disable_page(&self) -> Result<()> {
        self.run(Command::Page(PageCommand::Disable {})).await
    }

    /// Sends a command and discards its result.
    async fn run(&self, command: Command) -> Result<()> {
        self.connection.call_command(&command).await.map(drop)
    }
}

// ============================================================================
// Session - Navigation and Events
// ============================================================================

impl Session {
    /// Starts navigating to `url` without waiting for the reply.
    ///
    /// Completion is observed through events. Subscribe before calling this
    /// or early events are lost.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionLost`](crate::Error::ConnectionLost) if the
    /// command cannot be written.
    pub async fn navigate(&self, url: &str) -> Result<CommandId> {
        debug!(session_id = %self.id, %url, "Navigating");
        self.connection
            .send_command(&Command::Page(PageCommand::Navigate {
                url: url.to_string(),
            }))
            .await
    }

    /// Waits for the first event named `method`.
    ///
    /// # Errors
    ///
    /// See [`Connection::wait_for_event`].
    pub async fn wait_for_event(&self, method: &str) -> Result<Event> {
        self.connection.wait_for_event(method).await
    }
}

// ============================================================================
// Session - Lifecycle
// ============================================================================

impl Session {
    /// Closes the connection, kills the browser, and removes the user-data
    /// directory.
    ///
    /// Never fails; cleanup problems are logged.
    pub async fn close(self) {
        let Self {
            id,
            connection,
            process,
            user_data,
            ..
        } = self;

        connection.close().await;

        if let Some(mut process) = process {
            process.kill().await;
        }

        if let Some(user_data) = user_data {
            user_data.cleanup();
        }

        info!(session_id = %id, "Session closed");
    }
}

// ============================================================================
// Tests
// ============================================================================
