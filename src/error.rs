//! Error Taxonomy
//!
//! Typed errors for the client-visible command surface. The `Display` strings
//! are exactly the one-line responses a client sees, so handlers can render
//! failures with `to_string()` and nothing else.
//!
//! Network and persistence plumbing elsewhere in the crate uses `anyhow`;
//! these enums cover only the outcomes a client is expected to branch on.

use thiserror::Error;

/// Failures raised by the local [`KeyValueStore`](crate::store::memory::KeyValueStore).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The key is not present in the map. Raised by `get` and `delete`.
    #[error("key '{key}' does not exist")]
    NotFound { key: String },
}

/// Failures surfaced to a client for one request, each rendered as the
/// single response line for that request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("key '{key}' does not exist")]
    NotFound { key: String },

    /// Unknown verb in the command.
    #[error("invalid request '{verb}'; must be GET, PUT, DELETE or STOP")]
    InvalidCommand { verb: String },

    /// Known verb, wrong number of tab-separated arguments.
    #[error("invalid number of arguments for {verb}; must be exactly {expected}")]
    InvalidArgumentCount { verb: &'static str, expected: usize },

    /// The 2PC round did not reach unanimous agreement: a participant was
    /// busy, voted no, or was unreachable. The client decides whether to retry.
    #[error("request aborted; one or more participants failed to prepare or commit")]
    TransactionAborted,

    /// The coordinator could not be reached, or a mutation broadcast failed
    /// after a successful round.
    #[error("coordinator request failed: {0}")]
    Coordinator(anyhow::Error),

    /// Writing the store snapshot on STOP failed.
    #[error("failed to persist store snapshot: {0}")]
    Persistence(anyhow::Error),
}

impl From<StoreError> for RequestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { key } => RequestError::NotFound { key },
        }
    }
}
