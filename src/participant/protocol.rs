//! Participant Network Protocol
//!
//! Defines the API endpoints and Data Transfer Objects (DTOs) a participant
//! exposes over HTTP: the client-facing command gateway, the vote calls the
//! coordinator fans out during a round, the busy/idle flag accessors, and the
//! post-commit apply operations.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Client-facing command gateway (tab-separated GET/PUT/DELETE/STOP).
pub const ENDPOINT_REQUEST: &str = "/request";
/// Phase-1 vote call, invoked by the coordinator during a round.
pub const ENDPOINT_VOTE_PREPARE: &str = "/vote/prepare";
/// Phase-2 vote call.
pub const ENDPOINT_VOTE_COMMIT: &str = "/vote/commit";
/// Direct local read, not part of the 2PC protocol.
pub const ENDPOINT_KV: &str = "/kv";
/// Post-commit write, only ever called after a unanimous round.
pub const ENDPOINT_APPLY_PUT: &str = "/internal/put";
/// Post-commit removal, only ever called after a unanimous round.
pub const ENDPOINT_APPLY_DELETE: &str = "/internal/delete";
/// Busy flag: GET reads it, POST sets it.
pub const ENDPOINT_STATE_BUSY: &str = "/state/busy";
/// Resets the busy flag; invoked by the coordinator after collecting a vote.
pub const ENDPOINT_STATE_IDLE: &str = "/state/idle";

// --- Data Transfer Objects ---

/// One raw client command, forwarded verbatim to `handle_request`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

/// The single response line for a command: exactly one of `response` or
/// `error` is set.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub response: Option<String>,
    pub error: Option<String>,
}

/// A participant's verdict for one vote call.
#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub vote: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BusyResponse {
    pub busy: bool,
}

/// Value for a direct read. `None` means the key does not exist.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetValueResponse {
    pub value: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApplyPutRequest {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApplyDeleteRequest {
    pub key: String,
}

/// Standard acknowledgment for apply and flag operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}
