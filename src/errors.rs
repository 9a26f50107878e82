use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Failed to load image '{locator}': {message}")]
    ImageLoadError { locator: String, message: String },

    #[error("Unsupported locator: {locator}")]
    UnsupportedLocator { locator: String },

    #[error("File not found: {locator}")]
    FileNotFound { locator: String },

    #[error("Loading '{locator}' timed out after {}s", .timeout.as_secs())]
    LoadTimeout { locator: String, timeout: Duration },

    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },

    #[error("Settings error: {message}")]
    SettingsError { message: String },

    #[error("Store error: {message}")]
    StoreError { message: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, FrameError>;

impl FrameError {
    /// Returns true if retrying the same operation may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FrameError::FileNotFound { .. }
                | FrameError::LoadTimeout { .. }
                | FrameError::IoError { .. }
                | FrameError::Cancelled
        )
    }

    /// Returns a user-facing message with a recovery hint
    pub fn user_message(&self) -> String {
        let base_message = self.to_string();
        let suggestion = match self {
            FrameError::FileNotFound { .. } => "Check that the file still exists and is readable.",
            FrameError::UnsupportedLocator { .. } => "Pick a local image file or a supported address.",
            FrameError::LoadTimeout { .. } => "The image took too long to load. Check the connection and try again.",
            FrameError::ImageLoadError { .. } => "The image may be corrupted or in an unsupported format.",
            FrameError::InvalidDimensions { .. } => "The image reports an empty size and cannot be shown.",
            FrameError::SettingsError { .. } | FrameError::StoreError { .. } => "Saved preferences could not be used; defaults apply.",
            FrameError::IoError { .. } => "File system error occurred. Check storage and permissions.",
            _ => "An unexpected error occurred.",
        };

        format!("{}\n\n{}", base_message, suggestion)
    }

    /// Returns an error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            FrameError::ImageLoadError { .. } => "IMAGE_LOAD_ERROR",
            FrameError::UnsupportedLocator { .. } => "UNSUPPORTED_LOCATOR",
            FrameError::FileNotFound { .. } => "FILE_NOT_FOUND",
            FrameError::LoadTimeout { .. } => "LOAD_TIMEOUT",
            FrameError::InvalidDimensions { .. } => "INVALID_DIMENSIONS",
            FrameError::SettingsError { .. } => "SETTINGS_ERROR",
            FrameError::StoreError { .. } => "STORE_ERROR",
            FrameError::IoError { .. } => "IO_ERROR",
            FrameError::JsonError { .. } => "JSON_ERROR",
            FrameError::Cancelled => "CANCELLED",
        }
    }

    /// Logs the error with its code
    pub fn log(&self) {
        tracing::warn!(code = self.error_code(), "{}", self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_recovery() {
        let error = FrameError::FileNotFound {
            locator: "/sdcard/Pictures/missing.jpg".to_string(),
        };
        assert!(error.is_recoverable());
        assert_eq!(error.error_code(), "FILE_NOT_FOUND");
        assert!(error.user_message().contains("still exists"));

        let error = FrameError::UnsupportedLocator {
            locator: "ftp://example.com/a.png".to_string(),
        };
        assert!(!error.is_recoverable());
        assert_eq!(error.error_code(), "UNSUPPORTED_LOCATOR");
    }

    #[test]
    fn test_timeout_message_mentions_seconds() {
        let error = FrameError::LoadTimeout {
            locator: "https://example.com/a.jpg".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert!(error.to_string().contains("30s"));
    }
}
