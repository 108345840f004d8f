use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hotkey error: {0}")]
    Hotkey(String),
}

/// Analysis-related errors
///
/// These never escape the analyzer: every variant is folded into a
/// structurally complete `Analysis` with `success == false` before the
/// pipeline sees it.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Failed to read capture file: {0}")]
    ReadImage(#[from] std::io::Error),

    #[error("Analysis timed out after {0} seconds")]
    Timeout(u64),
}
