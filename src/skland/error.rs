//! Error types for the Skland session and attendance endpoints.
//!
//! [`SklandError`] covers everything that can go wrong while establishing a
//! session. Check-in calls use the closed [`CheckInError`] instead, so the
//! retry loop only ever matches on three cases.

use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SklandError {
    /// The service answered but reported a non-success code.
    #[error("API error (code {code}): {message}")]
    Api { code: i64, message: String },

    /// Non-2xx HTTP status.
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Transport failure. The underlying error is kept as `source()` so
    /// callers can walk the cause chain.
    #[error("{context}")]
    Network {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("failed to sign request: {0}")]
    Sign(String),
}

impl SklandError {
    pub fn network(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// Errors raised by a single check-in attempt.
#[derive(Debug, Error)]
pub enum CheckInError {
    /// HTTP 403: the character already checked in today.
    #[error("already checked in today")]
    AlreadyCheckedIn,

    /// The service rejected the request with a structured error.
    #[error("{message}")]
    Rejected { message: String, raw: String },

    /// Transport or decoding failure; carries the rendered error text.
    #[error("{0}")]
    Transport(String),
}

impl From<SklandError> for CheckInError {
    fn from(err: SklandError) -> Self {
        match err {
            SklandError::Status { status: 403, .. } => CheckInError::AlreadyCheckedIn,
            SklandError::Api { code, message } => CheckInError::Rejected {
                raw: format!("{{\"code\": {code}, \"message\": {message:?}}}"),
                message,
            },
            SklandError::Status { status, body } => CheckInError::Rejected {
                message: format!("HTTP {status}"),
                raw: body,
            },
            other => CheckInError::Transport(render_chain(&other)),
        }
    }
}

/// Renders an error and its causes as `outer: inner: innermost`.
pub fn render_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(cause) = cur {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        cur = cause.source();
    }
    out
}
