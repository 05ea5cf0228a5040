//! Private user-data directory for one browser process.
//!
//! Each session gets a fresh temporary directory so that no state leaks
//! between sessions. The directory is removed when the [`UserDataDir`] is
//! dropped or explicitly cleaned up.

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Prefix of generated directory names.
const TEMP_PREFIX: &str = "chrome-recorder-";

// ============================================================================
// UserDataDir
// ============================================================================

/// A temporary Chrome user-data directory.
#[derive(Debug)]
pub struct UserDataDir {
    /// Temporary directory handle (keeps the directory alive).
    temp_dir: TempDir,
    /// Path to the directory.
    path: PathBuf,
}

impl UserDataDir {
    /// Creates a new temporary user-data directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the directory cannot be created.
    pub fn new_temp() -> Result<Self> {
        Self::new_in(std::env::temp_dir())
    }

    /// Creates a new user-data directory inside `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the directory cannot be created.
    pub fn new_in(parent: impl AsRef<Path>) -> Result<Self> {
        let temp_dir = TempDir::with_prefix_in(TEMP_PREFIX, parent)?;

        let path = temp_dir.path().to_path_buf();
        debug!(path = %path.display(), "Created user data dir");

        Ok(Self { temp_dir, path })
    }

    /// Returns the path to the directory.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the directory, ignoring failures.
    ///
    /// Chrome may still be flushing files when this runs.
    pub fn cleanup(self) {
        let path = self.path;
        match self.temp_dir.close() {
            Ok(()) => debug!(path = %path.display(), "Removed user data dir"),
            Err(e) => debug!(path = %path.display(), error = %e, "Failed to remove user data dir"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
