//! Error type shared by every stage of the enhancement pipeline.

use std::time::Duration;

use nexora_core::error::CoreError;

/// A terminal failure from any enhancement stage.
///
/// The `Display` output of each variant is the single descriptive message
/// surfaced to the end user.
#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    /// File type or size rejected locally; no network call was made.
    #[error("{0}")]
    Validation(String),

    /// The image could not be decoded, or is still oversized after resizing.
    #[error("{0}")]
    Dimension(String),

    /// No response was received (connect failure, DNS, TLS, timeout).
    #[error("Network Error: {0}")]
    Network(String),

    /// A remote endpoint answered with a non-2xx status.
    #[error("API Error: {status} - {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A response parsed but lacked a required field.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// An upload or response body exceeded the transport size cap.
    #[error("Request too large: {size} bytes exceeds the {limit} byte limit")]
    RequestTooLarge { size: u64, limit: u64 },

    /// The upscaler reported a negative state code for the task.
    #[error("{message}")]
    RemoteTask { code: i32, message: String },

    /// The task was still running when the polling budget ran out.
    #[error("Enhancement timeout. Please try again later.")]
    Timeout { elapsed: Duration },

    /// The Nexora backend refused to store the result.
    #[error("{0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for EnhanceError {
    fn from(err: CoreError) -> Self {
        EnhanceError::Validation(err.message().to_string())
    }
}

impl From<reqwest::Error> for EnhanceError {
    fn from(err: reqwest::Error) -> Self {
        EnhanceError::Network(error_chain(&err))
    }
}

/// Render `err` and every `source()` below it as `outer: inner: ...`.
/// reqwest's `Display` omits the source chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
