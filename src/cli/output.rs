//! Screenshot file naming and writing.
//!
//! File names are derived from the URL (and tunnel config, if any) so that
//! repeated runs overwrite the same files:
//!
//! | Input | File |
//! |-------|------|
//! | `https://example.com` | `results/https_example_com.png` |
//! | `eu.ovpn` + `https://example.com` | `results/eu_ovpn-https_example_com.png` |

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Default directory for screenshots.
pub const DEFAULT_OUTPUT_DIR: &str = "results";

// ============================================================================
// Naming
// ============================================================================

/// Makes `url` safe to use as a file name.
///
/// Removes `/`, maps `:` and `.` to `_`, and space to `-`.
#[must_use]
pub fn sanitize_url(url: &str) -> String {
    url.chars()
        .filter(|&c| c != '/')
        .map(|c| match c {
            ':' | '.' => '_',
            ' ' => '-',
            other => other,
        })
        .collect()
}

/// Returns the screenshot path for `url`, prefixed by the tunnel config's
/// file name when one is in use.
#[must_use]
pub fn screenshot_path(output_dir: &Path, url: &str, tunnel_config: Option<&Path>) -> PathBuf {
    let name = match tunnel_config {
        Some(config) => {
            let base = config
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("{}-{}.png", sanitize_url(&base), sanitize_url(url))
        }
        None => format!("{}.png", sanitize_url(url)),
    };

    output_dir.join(name)
}

// ============================================================================
// Writing
// ============================================================================

/// Writes screenshot bytes to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if the directory or file cannot
/// be written.
pub async fn write_screenshot(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::fs::write(path, bytes).await?;
    info!(path = %path.display(), bytes = bytes.len(), "Screenshot written");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
