//! Chrome command-line options.
//!
//! Provides a type-safe interface for configuring the browser process:
//! headless mode, window size, and extra command-line arguments. The
//! debugging port and user-data directory are added at launch.
//!
//! # Example
//!
//! ```ignore
//! use chrome_recorder::ChromeOptions;
//!
//! let options = ChromeOptions::new()
//!     .with_headless()
//!     .with_window_size(1920, 1080);
//!
//! let args = options.to_args();
//! // ["--window-size=1920,1080", "--no-first-run", "--headless", "--disable-gpu"]
//! ```

// ============================================================================
// Constants
// ============================================================================

/// Default viewport, tall enough to capture most of a landing page.
pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (1280, 1696);

// ============================================================================
// ChromeOptions
// ============================================================================

/// Chrome process configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromeOptions {
    /// Run Chrome without a GUI (headless mode).
    pub headless: bool,

    /// Window dimensions in pixels (width, height).
    pub window_size: Option<(u32, u32)>,

    /// Additional custom command-line arguments.
    pub extra_args: Vec<String>,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ChromeOptions {
    /// Creates options with the default window size, headed.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            headless: false,
            window_size: Some(DEFAULT_WINDOW_SIZE),
            extra_args: Vec::new(),
        }
    }

    /// Creates options configured for headless mode.
    #[inline]
    #[must_use]
    pub fn headless() -> Self {
        Self::new().with_headless()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ChromeOptions {
    /// Enables headless mode.
    #[inline]
    #[must_use]
    pub fn with_headless(mut self) -> Self {
        self.headless = true;
        self
    }

    /// Sets headless mode on or off.
    #[inline]
    #[must_use]
    pub fn with_headless_mode(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Sets window size in pixels.
    #[inline]
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = Some((width, height));
        self
    }

    /// Adds a custom command-line argument.
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Adds multiple custom command-line arguments.
    #[inline]
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl ChromeOptions {
    /// Converts options to Chrome command-line arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(4 + self.extra_args.len());

        if let Some((width, height)) = self.window_size {
            args.push(format!("--window-size={width},{height}"));
        }

        args.push("--no-first-run".to_string());

        if self.headless {
            args.push("--headless".to_string());
            args.push("--disable-gpu".to_string());
        }

        args.extend(self.extra_args.clone());
        args
    }

    /// Validates the options configuration.
    ///
    /// # Errors
    ///
    /// Returns error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if let Some((width, height)) = self.window_size
            && (width == 0 || height == 0)
        {
            return Err("Window dimensions must be greater than zero".to_string());
        }

        if let Some(arg) = self
            .extra_args
            .iter()
            .find(|a| a.starts_with("--remote-debugging-port") || a.starts_with("--user-data-dir"))
        {
            return Err(format!("{arg} is managed by the driver"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
