//! Result and error types for cartprobe.

use thiserror::Error;

/// Result type for cartprobe operations
pub type CartprobeResult<T> = Result<T, CartprobeError>;

/// Errors that can occur while auditing a storefront
#[derive(Debug, Error)]
pub enum CartprobeError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Page-level error (element resolution, interaction)
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Script evaluation error
    #[error("Script evaluation failed: {message}")]
    Eval {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Login could not be completed
    #[error("Login failed: {message}")]
    Login {
        /// Error message
        message: String,
    },

    /// Scenario-level failure (product page never loaded, etc.)
    #[error("Scenario failed: {message}")]
    Scenario {
        /// Error message
        message: String,
    },

    /// Fixture file missing or malformed
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// Export artifact could not be produced
    #[error("Export failed: {message}")]
    Export {
        /// Error message
        message: String,
    },

    /// Logging initialisation error
    #[error("Logging setup failed: {message}")]
    Logging {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Worksheet error
    #[error("Worksheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl CartprobeError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Create a script evaluation error
    #[must_use]
    pub fn eval(message: impl Into<String>) -> Self {
        Self::Eval {
            message: message.into(),
        }
    }

    /// Create a fixture error
    #[must_use]
    pub fn fixture(message: impl Into<String>) -> Self {
        Self::Fixture {
            message: message.into(),
        }
    }

    /// Create a scenario error
    #[must_use]
    pub fn scenario(message: impl Into<String>) -> Self {
        Self::Scenario {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_error_display() {
        let err = CartprobeError::page("element vanished");
        assert!(err.to_string().contains("Page error"));
        assert!(err.to_string().contains("element vanished"));
    }

    #[test]
    fn test_timeout_display() {
        let err = CartprobeError::Timeout { ms: 3000 };
        assert_eq!(err.to_string(), "Operation timed out after 3000ms");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CartprobeError = io.into();
        assert!(matches!(err, CartprobeError::Io(_)));
    }
}
