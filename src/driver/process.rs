//! Browser process launch and termination.

// ============================================================================
// Imports
// ============================================================================

use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::options::ChromeOptions;
use super::user_data::UserDataDir;

// ============================================================================
// Port Selection
// ============================================================================

/// Picks an unused local TCP port.
///
/// The port is released before Chrome binds it, so another process could
/// take it in between.
///
/// # Errors
///
/// Returns [`Error::Io`] if no port can be bound.
pub fn pick_unused_port() -> Result<u16> {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))?;
    Ok(listener.local_addr()?.port())
}

// ============================================================================
// BrowserProcess
// ============================================================================

/// Guards a child browser process and ensures it is killed when dropped.
#[derive(Debug)]
pub struct BrowserProcess {
    /// The child process handle.
    child: Option<Child>,
    /// Process ID for logging.
    pid: u32,
}

impl BrowserProcess {
    /// Starts the browser with remote debugging on `port`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProcessLaunchFailed`] if the process fails to spawn.
    pub fn spawn(
        binary: &Path,
        options: &ChromeOptions,
        port: u16,
        user_data: &UserDataDir,
    ) -> Result<Self> {
        let mut cmd = Command::new(binary);

        cmd.arg(format!("--remote-debugging-port={port}"))
            .arg(format!("--user-data-dir={}", user_data.path().display()));

        cmd.args(options.to_args());

        // Suppress stdio
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        debug!(binary = %binary.display(), port, headless = options.headless, "Spawning browser");

        let child = cmd.spawn().map_err(Error::process_launch_failed)?;
        Ok(Self::new(child))
    }

    /// Wraps an already spawned child.
    fn new(child: Child) -> Self {
        let pid = child.id().unwrap_or(0);
        info!(pid, "Browser process started");
        Self {
            child: Some(child),
            pid,
        }
    }

    /// Returns the process ID.
    #[inline]
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Returns the exit status if the process has already exited.
    pub fn exit_status(&mut self) -> Option<ExitStatus> {
        self.child.as_mut().and_then(|c| c.try_wait().ok().flatten())
    }

    /// Kills the process and waits for it to exit.
    ///
    /// Failures are logged, not returned: the process may already be gone.
    pub async fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!(pid = self.pid, "Killing browser process");
            if let Err(e) = child.kill().await {
                debug!(pid = self.pid, error = %e, "Failed to kill process");
            }
            info!(pid = self.pid, "Browser process terminated");
        }
    }
}

impl Drop for BrowserProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take()
            && let Err(e) = child.start_kill()
        {
            debug!(pid = self.pid, error = %e, "Failed to send kill signal in Drop");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
