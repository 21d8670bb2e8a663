//! Custom error types for auto-clicker.
//!
//! Library code returns [`ClickerError`]; the binary and the thin OS glue
//! (hotkeys, window lookup) use `anyhow` on top of it.

use std::io;
use thiserror::Error;

/// Main error type for auto-clicker operations.
#[derive(Error, Debug)]
pub enum ClickerError {
    /// `start` was called before a target position was configured.
    #[error("no click position configured; select a position first")]
    NoPosition,

    /// Manually entered position could not be parsed.
    #[error("invalid position '{value}': {reason}")]
    InvalidPosition { value: String, reason: String },

    /// A single click injection failed. The loop tolerates this.
    #[error("{strategy} click failed: {reason}")]
    Injection {
        strategy: &'static str,
        reason: String,
    },

    /// Unexpected failure inside the click loop outside the strategy call.
    #[error("click loop aborted: {0}")]
    LoopFatal(String),

    /// Configuration validation error.
    #[error("configuration error: {0}")]
    ConfigValidation(String),

    /// Error reading or parsing configuration file.
    #[error("failed to load config from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// Error writing configuration file.
    #[error("failed to save config to '{path}': {reason}")]
    ConfigSave { path: String, reason: String },

    /// Error parsing duration string.
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    /// Platform-specific operation is not supported.
    #[error("operation not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    /// Error registering or handling hotkey.
    #[error("hotkey error: {0}")]
    Hotkey(String),

    /// Error resolving or addressing a target window.
    #[error("window error: {0}")]
    Window(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for auto-clicker operations.
pub type Result<T> = std::result::Result<T, ClickerError>;

impl ClickerError {
    /// Create a new InvalidPosition error.
    pub fn invalid_position(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPosition {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new Injection error.
    pub fn injection(strategy: &'static str, reason: impl Into<String>) -> Self {
        Self::Injection {
            strategy,
            reason: reason.into(),
        }
    }

    /// Create a new LoopFatal error.
    pub fn loop_fatal(message: impl Into<String>) -> Self {
        Self::LoopFatal(message.into())
    }

    /// Create a new ConfigValidation error.
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation(message.into())
    }

    /// Create a new ConfigLoad error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new ConfigSave error.
    pub fn config_save(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigSave {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidDuration error.
    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new UnsupportedPlatform error.
    pub fn unsupported_platform(message: impl Into<String>) -> Self {
        Self::UnsupportedPlatform(message.into())
    }

    /// Create a new Hotkey error.
    pub fn hotkey(message: impl Into<String>) -> Self {
        Self::Hotkey(message.into())
    }

    /// Create a new Window error.
    pub fn window(message: impl Into<String>) -> Self {
        Self::Window(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClickerError::NoPosition;
        assert_eq!(
            err.to_string(),
            "no click position configured; select a position first"
        );

        let err = ClickerError::invalid_position("12,abc", "y is not a number");
        assert_eq!(
            err.to_string(),
            "invalid position '12,abc': y is not a number"
        );

        let err = ClickerError::injection("send-message", "no foreground window");
        assert_eq!(
            err.to_string(),
            "send-message click failed: no foreground window"
        );

        let err = ClickerError::config_validation("interval must be greater than zero");
        assert_eq!(
            err.to_string(),
            "configuration error: interval must be greater than zero"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: ClickerError = io_err.into();
        assert!(matches!(err, ClickerError::Io(_)));
    }
}
