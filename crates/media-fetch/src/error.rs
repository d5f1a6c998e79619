//! Media pipeline errors.

use thiserror::Error;

/// Errors raised while resolving, retrieving or transcoding media.
///
/// The `Display` text of each variant is written for end users; the bot
/// replies with it verbatim.
#[derive(Error, Debug)]
pub enum MediaError {
    /// The locator does not look like a supported media URL.
    #[error("Invalid YouTube URL provided.")]
    InvalidSource(String),

    /// The search backend failed (as opposed to returning no hits).
    #[error("YouTube search failed: {0}")]
    SearchFailed(String),

    /// Metadata or stream retrieval failed.
    #[error("{0}")]
    Retrieval(String),

    #[error("No suitable audio format found.")]
    NoSuitableFormat,

    /// Declared size exceeds the configured ceiling.
    #[error("File is too large ({size_mb:.2}MB). Max size is {max_mb}MB.")]
    TooLarge { size_mb: f64, max_mb: f64 },

    /// Encoder fault or mid-stream interruption.
    #[error("Conversion failed: {0}")]
    Transcode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MediaResult<T> = Result<T, MediaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message_carries_both_limits() {
        let err = MediaError::TooLarge {
            size_mb: 123.456,
            max_mb: 100.0,
        };
        assert_eq!(
            err.to_string(),
            "File is too large (123.46MB). Max size is 100MB."
        );
    }

    #[test]
    fn test_retrieval_message_is_passed_through() {
        let err = MediaError::Retrieval("Video unavailable".into());
        assert_eq!(err.to_string(), "Video unavailable");
    }
}
