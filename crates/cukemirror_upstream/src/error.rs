//! Error types for upstream fetches.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, UpstreamError>;

#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Connection, TLS, timeout or body read failure.
    #[error("Upstream unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// The upstream answered with a non-2xx status.
    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not the JSON-API document we expected.
    #[error("Failed to decode {resource} response: {source}")]
    Decode {
        resource: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl UpstreamError {
    /// HTTP status carried by a [`UpstreamError::Status`], if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unavailable(err) => err.status().map(|s| s.as_u16()),
            Self::Decode { .. } => None,
        }
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}
