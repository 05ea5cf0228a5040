//! PNG screenshot of the visible viewport.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Command, PageCommand};

use super::Session;

impl Session {
    /// Captures a PNG screenshot and returns the decoded bytes.
    ///
    /// # Errors
    ///
    /// - Any call error of `Page.captureScreenshot`
    /// - [`Error::Protocol`] if the reply has no `data` string
    /// - [`Error::Base64`] if `data` does not decode
    pub async fn capture_screenshot(&self) -> Result<Vec<u8>> {
        debug!(session_id = %self.id(), "Capturing screenshot");

        let command = Command::Page(PageCommand::CaptureScreenshot {
            format: Some("png".to_string()),
        });
        let result = self.connection().call_command(&command).await?;

        let data = result.get("data").and_then(Value::as_str).ok_or_else(|| {
            Error::protocol(format!("Screenshot reply missing data field. Got: {result}"))
        })?;

        Ok(Base64Standard.decode(data)?)
    }
}
