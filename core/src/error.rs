//! Error types for the CalX API client.
//!
//! # Design
//! Every non-2xx response maps to exactly one of four status variants so
//! callers can tell an authentication failure from a permanent client-side
//! mistake or a transient server failure. Failures that happen before a
//! response exists (signing, transport, bad base URL) get their own
//! variants and carry the underlying message unchanged.

use thiserror::Error;

/// Coarse classification of an API error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Client,
    Server,
    Unknown,
}

/// Errors returned by `CalxClient` operations and the response classifier.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 401.
    #[error("{message}")]
    Authentication { status: u16, message: String },

    /// The server returned a 4xx status other than 401.
    #[error("{message}")]
    Client { status: u16, message: String },

    /// The server returned a 5xx status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Any other non-success status, e.g. a redirect.
    #[error("{message}")]
    Unexpected { status: u16, message: String },

    /// A response body that had to be JSON could not be parsed.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    #[error("failed to sign request: {0}")]
    Signing(String),

    #[error("{0}")]
    Transport(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Kind of a status error, `None` for failures without a response.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApiError::Authentication { .. } => Some(ErrorKind::Authentication),
            ApiError::Client { .. } => Some(ErrorKind::Client),
            ApiError::Server { .. } => Some(ErrorKind::Server),
            ApiError::Unexpected { .. } => Some(ErrorKind::Unknown),
            _ => None,
        }
    }

    /// HTTP status for errors built from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Authentication { status, .. }
            | ApiError::Client { status, .. }
            | ApiError::Server { status, .. }
            | ApiError::Unexpected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for every 4xx error, 401 included.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApiError::Authentication { .. } | ApiError::Client { .. })
    }
}
