use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for the article-rewriter library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// API key was not provided and could not be found in the environment.
    #[error("OpenAI API key is not set. Export OPENAI_API_KEY or pass it explicitly.")]
    MissingApiKey,

    /// File exists but is not a valid Word document.
    #[error("'{path}' is not a valid .docx document: {message}")]
    Document {
        /// Path to the malformed document
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// A single chat-completion call failed.
    ///
    /// This is the transient error consumed by the retry loop in
    /// [`RewriteClient`](crate::RewriteClient); callers of the client only
    /// ever observe [`Error::ExhaustedRetries`].
    #[error("API call failed: {message}")]
    Api {
        /// Error message from transport, status, or response parsing
        message: String,
    },

    /// Every attempt of the retry schedule failed.
    #[error("Generation failed after {attempts} attempts: {message}")]
    ExhaustedRetries {
        /// Number of attempts performed
        attempts: usize,
        /// Message of the last attempt's error
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a malformed-document error.
    #[must_use]
    pub fn document(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Document {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an API call error.
    #[must_use]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Creates an exhausted-retries error from the last attempt's failure.
    #[must_use]
    pub fn exhausted(attempts: usize, last: &Self) -> Self {
        Self::ExhaustedRetries {
            attempts,
            message: last.to_string(),
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if this error aborts a run before any file is touched.
    #[must_use]
    pub const fn is_setup(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::MissingApiKey)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test message");
        assert!(err.is_config());
        assert!(err.is_setup());
        assert!(err.to_string().contains("test message"));
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/tmp/test.docx", io_err);
        assert!(err.is_io());
        assert!(!err.is_setup());
        assert!(err.to_string().contains("/tmp/test.docx"));
    }

    #[test]
    fn test_exhausted_carries_last_message() {
        let last = Error::api("status 500");
        let err = Error::exhausted(10, &last);
        let text = err.to_string();
        assert!(text.contains("10 attempts"));
        assert!(text.contains("status 500"));
    }

    #[test]
    fn test_error_clone() {
        let err = Error::document("a.docx", "not a zip");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_serialization_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().contains("Serialization error"));
    }
}
