//! Error type for the hosted backend clients.

use derive_more::{Display, Error};

/// Remote-call error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Backend error: {} at {}:{}", message, file, line)]
pub struct BackendError {
    /// Error message.
    pub message: String,
    /// Line number where the error occurred.
    pub line: u32,
    /// Source file where the error occurred.
    pub file: &'static str,
}

impl BackendError {
    /// Creates a new backend error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("HTTP error: {}", err))
    }
}

impl From<serde_json::Error> for BackendError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("JSON error: {}", err))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for BackendError {
    #[track_caller]
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::new(format!("WebSocket error: {}", err))
    }
}
