//! OpenVPN tunnel subprocess.
//!
//! The tunnel is brought up with `sudo openvpn` and given a fixed time to
//! connect. Teardown runs `sudo killall openvpn`, which also stops tunnels
//! this process did not start.

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Time given to the tunnel to come up.
pub const DEFAULT_TUNNEL_SETTLE: Duration = Duration::from_secs(4);

/// Time given to `killall` and then to the tunnel process to exit.
pub const DEFAULT_TEARDOWN_GRACE: Duration = Duration::from_secs(5);

// ============================================================================
// Commands
// ============================================================================

/// Command line that brings a tunnel up.
#[must_use]
pub fn up_command(config: &Path, auth: Option<&Path>) -> Vec<String> {
    let mut args = vec![
        "sudo".to_string(),
        "openvpn".to_string(),
        "--config".to_string(),
        config.display().to_string(),
    ];

    if let Some(auth) = auth {
        args.push("--auth-user-pass".to_string());
        args.push(auth.display().to_string());
    }

    args
}

/// Command line that tears all tunnels down.
#[must_use]
pub fn down_command() -> Vec<String> {
    vec![
        "sudo".to_string(),
        "killall".to_string(),
        "openvpn".to_string(),
    ]
}

// ============================================================================
// Tunnel
// ============================================================================

/// A running tunnel subprocess.
#[derive(Debug)]
pub struct Tunnel {
    /// The `sudo openvpn` child.
    child: Child,
    /// Config file the tunnel was started with.
    config: PathBuf,
}

impl Tunnel {
    /// Starts the tunnel and waits `settle` for it to connect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProcessLaunchFailed`] if the subprocess cannot be
    /// spawned.
    pub async fn start(config: &Path, auth: Option<&Path>, settle: Duration) -> Result<Self> {
        let child = spawn(&up_command(config, auth))?;
        info!(config = %config.display(), pid = child.id(), "Tunnel starting");

        tokio::time::sleep(settle).await;

        Ok(Self {
            child,
            config: config.to_path_buf(),
        })
    }

    /// Tears the tunnel down.
    ///
    /// Never fails; problems are logged.
    pub async fn teardown(self) {
        self.stop(DEFAULT_TEARDOWN_GRACE).await;
    }

    /// Runs `killall`, then waits up to `grace` for the child to exit
    /// before killing it directly.
    async fn stop(mut self, grace: Duration) {
        match spawn(&down_command()) {
            Ok(mut killall) => match timeout(grace, killall.wait()).await {
                Ok(Ok(status)) if !status.success() => {
                    warn!(%status, "Tunnel teardown command failed");
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!(error = %e, "Tunnel teardown did not finish"),
                Err(_) => {
                    warn!(grace_ms = grace.as_millis(), "Tunnel teardown command hung");
                    let _ = killall.start_kill();
                }
            },
            Err(e) => warn!(error = %e, "Failed to run tunnel teardown"),
        }

        match timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "Tunnel process exited"),
            Ok(Err(e)) => {
                debug!(error = %e, "Failed to reap tunnel process");
                self.force_kill().await;
            }
            Err(_) => {
                warn!(
                    config = %self.config.display(),
                    "Tunnel process outlived teardown, killing it"
                );
                self.force_kill().await;
            }
        }

        info!(config = %self.config.display(), "Tunnel stopped");
    }

    /// Kills and reaps the child.
    async fn force_kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "Failed to kill tunnel process");
        }
    }
}

/// Spawns `argv` with stdin closed.
fn spawn(argv: &[String]) -> Result<Child> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::invalid_argument("Empty command line"))?;

    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .spawn()
        .map_err(Error::process_launch_failed)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_up_command() {
        let argv = up_command(Path::new("eu.ovpn"), Some(Path::new("auth.txt")));
        assert_eq!(
            argv,
            vec![
                "sudo",
                "openvpn",
                "--config",
                "eu.ovpn",
                "--auth-user-pass",
                "auth.txt"
            ]
        );
    }

    #[test]
    fn test_up_command_without_auth() {
        let argv = up_command(Path::new("eu.ovpn"), None);
        assert_eq!(argv, vec!["sudo", "openvpn", "--config", "eu.ovpn"]);
    }

    #[test]
    fn test_down_command() {
        assert_eq!(down_command(), vec!["sudo", "killall", "openvpn"]);
    }

    #[tokio::test]
    async fn test_spawn_empty_command_line() {
        let err = spawn(&[]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stop_kills_child_killall_missed() {
        // killall only targets openvpn, so this child survives it
        let child = spawn(&["sleep".to_string(), "30".to_string()]).expect("spawn");
        let tunnel = Tunnel {
            child,
            config: PathBuf::from("eu.ovpn"),
        };

        let stop = tunnel.stop(Duration::from_millis(200));
        assert!(timeout(Duration::from_secs(5), stop).await.is_ok());
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let err = spawn(&["/nonexistent/openvpn".to_string()]).unwrap_err();
        assert!(matches!(err, Error::ProcessLaunchFailed { .. }));
    }
}
