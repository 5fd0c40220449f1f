//! Error types for the Lumo client core.
//!
//! # Design
//! `ApiError` is the failure half of every request outcome. Nothing is
//! thrown across the network boundary: transport failures, non-2xx statuses
//! and shape mismatches all come back as values. `Rejected` covers the
//! envelope convention where the server answers 2xx but sets
//! `success: false`.

use thiserror::Error;

/// Errors produced while building, executing or parsing an API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Base URL and path did not form a valid absolute URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body did not match the expected shape.
    #[error("decoding failed: {0}")]
    Decoding(String),

    /// The server answered with a status outside [200, 299].
    #[error("server returned HTTP {status}")]
    Server { status: u16, body: String },

    /// DNS, connect, timeout or connection reset.
    #[error("transport error: {0}")]
    Transport(String),

    /// The envelope reported `success: false`.
    #[error("request rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    /// The envelope reported success but carried no `result`.
    #[error("response envelope has no result")]
    MissingResult,
}

impl ApiError {
    /// HTTP status for `Server` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The exchange completed but the server answered non-2xx.
    pub fn is_server(&self) -> bool {
        matches!(self, ApiError::Server { .. })
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Errors from the local preference store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("preference store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("preference store is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors loading `LumoConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot open preference store: {0}")]
    Store(#[from] StoreError),
}

/// Failure of the synchronous half of an optimistic update.
///
/// Network failures are not `SyncError`s; they are reported through
/// `SyncOutcome` after the policy has been applied.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("local write failed: {0}")]
    Store(#[from] StoreError),
}
