//! Coordinator Network Protocol
//!
//! Defines the API endpoints and Data Transfer Objects (DTOs) the coordinator
//! exposes over HTTP: participant registration and the four broadcast
//! operations a participant invokes while serving a mutating client command.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

// --- API Endpoints ---

/// Called once by each participant at startup to join the roster.
pub const ENDPOINT_REGISTER: &str = "/participants/register";
/// Runs a full prepare+commit round; `ok` reports unanimity.
pub const ENDPOINT_BROADCAST_PREPARE: &str = "/broadcast/prepare";
/// Runs a standalone commit vote round.
pub const ENDPOINT_BROADCAST_COMMIT: &str = "/broadcast/commit";
/// Applies a write to every participant; only called after a unanimous round.
pub const ENDPOINT_BROADCAST_PUT: &str = "/broadcast/put";
/// Applies a removal to every participant; only called after a unanimous round.
pub const ENDPOINT_BROADCAST_DELETE: &str = "/broadcast/delete";

// --- Data Transfer Objects ---

/// Registration payload: where the coordinator can reach the participant.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub addr: SocketAddr,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Roster size after this registration.
    pub participants: usize,
}

/// Outcome of one vote round: `true` only on unanimous agreement.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoundResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BroadcastPutRequest {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BroadcastDeleteRequest {
    pub key: String,
}

/// Standard acknowledgment for apply broadcasts.
#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}
