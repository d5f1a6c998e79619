//! Application error types.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Signal error: {0}")]
    Signal(#[from] signal_client::SignalError),

    #[error("Media error: {0}")]
    Media(#[from] media_fetch::MediaError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A handler gave up for a reason of its own.
    #[error("Command failed: {0}")]
    Command(String),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;
