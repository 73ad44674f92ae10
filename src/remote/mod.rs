//! Remote delta source
//!
//! Defines the contract for fetching incremental deltas from the remote
//! concept repository, the decoded response shape, and the wire record
//! types. The concrete HTTP implementation lives in [`http`].

pub mod http;
pub mod records;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use thiserror::Error;

pub use http::HttpDeltaSource;

/// Failures raised by a delta source.
///
/// Both classes are fatal to the run; they differ only in what they tell the
/// operator (the network vs. the payload).
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote could not be reached, timed out, or answered with a
    /// non-success HTTP status.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// The response arrived but its payload could not be unpacked or decoded.
    #[error("protocol error: {message}")]
    Protocol { message: String },
}

impl From<FetchError> for crate::error::SyncError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Transport { message } => crate::error::SyncError::Transport { message },
            FetchError::Protocol { message } => crate::error::SyncError::Protocol { message },
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else {
            err.to_string()
        };
        FetchError::Transport { message }
    }
}

/// Decoded delta response.
///
/// `updated_to` is the server's authoritative "as of when" instant for this
/// delta; the engine stores it as the run checkpoint. It is never wall-clock
/// time on this side of the wire.
#[derive(Debug)]
pub struct DeltaResponse {
    /// Decoded records in wire encounter order, types interleaved.
    pub records: Vec<JsonValue>,
    /// Number of records in the payload.
    pub record_count: usize,
    /// Server-reported instant the delta is complete up to.
    pub updated_to: DateTime<Utc>,
}

/// Contract for fetching incremental deltas from the remote repository.
#[async_trait]
pub trait DeltaSource: Send + Sync {
    /// Fetch all changes since `since`, or the full export when `since` is
    /// absent (first synchronization).
    async fn fetch_updates(
        &self,
        url: &str,
        token: Option<&str>,
        since: Option<DateTime<Utc>>,
    ) -> Result<DeltaResponse, FetchError>;
}
