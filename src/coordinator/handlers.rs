use axum::{Json, extract::Extension, http::StatusCode};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::client::HttpParticipant;
use super::protocol::{
    AckResponse, BroadcastDeleteRequest, BroadcastPutRequest, RegisterRequest, RegisterResponse,
    RoundResponse,
};
use super::roster::save_roster;
use super::service::Coordinator;

/// Shared state for the coordinator's HTTP service: the protocol core plus
/// the address book it persists across restarts.
pub struct CoordinatorState {
    pub coordinator: Arc<Coordinator>,
    pub addresses: RwLock<Vec<SocketAddr>>,
    pub roster_path: Option<PathBuf>,
}

impl CoordinatorState {
    pub fn new(coordinator: Arc<Coordinator>, roster_path: Option<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            coordinator,
            addresses: RwLock::new(Vec::new()),
            roster_path,
        })
    }
}

/// Registers one participant: appends an HTTP handle to the roster and
/// re-persists the address list.
pub async fn handle_register(
    Extension(state): Extension<Arc<CoordinatorState>>,
    Json(req): Json<RegisterRequest>,
) -> (StatusCode, Json<RegisterResponse>) {
    state
        .coordinator
        .add_participant(Arc::new(HttpParticipant::new(req.addr)))
        .await;

    let mut addresses = state.addresses.write().await;
    addresses.push(req.addr);
    tracing::info!("Registered participant at {}", req.addr);

    if let Some(path) = &state.roster_path {
        if let Err(err) = save_roster(path, &addresses) {
            tracing::error!("Failed to persist roster: {}", err);
        }
    }

    (
        StatusCode::OK,
        Json(RegisterResponse {
            participants: addresses.len(),
        }),
    )
}

/// Runs a full prepare+commit round. `ok: false` covers both a clean abort
/// (busy participant or no vote) and an unreachable participant.
pub async fn handle_broadcast_prepare(
    Extension(state): Extension<Arc<CoordinatorState>>,
) -> (StatusCode, Json<RoundResponse>) {
    match state.coordinator.broadcast_prepare().await {
        Ok(ok) => (StatusCode::OK, Json(RoundResponse { ok })),
        Err(err) => {
            tracing::error!("Prepare broadcast failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RoundResponse { ok: false }),
            )
        }
    }
}

pub async fn handle_broadcast_commit(
    Extension(state): Extension<Arc<CoordinatorState>>,
) -> (StatusCode, Json<RoundResponse>) {
    match state.coordinator.broadcast_commit().await {
        Ok(ok) => (StatusCode::OK, Json(RoundResponse { ok })),
        Err(err) => {
            tracing::error!("Commit broadcast failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RoundResponse { ok: false }),
            )
        }
    }
}

pub async fn handle_broadcast_put(
    Extension(state): Extension<Arc<CoordinatorState>>,
    Json(req): Json<BroadcastPutRequest>,
) -> (StatusCode, Json<AckResponse>) {
    match state.coordinator.broadcast_put(&req.key, &req.value).await {
        Ok(()) => (StatusCode::OK, Json(AckResponse { success: true })),
        Err(err) => {
            tracing::error!("Put broadcast failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AckResponse { success: false }),
            )
        }
    }
}

pub async fn handle_broadcast_delete(
    Extension(state): Extension<Arc<CoordinatorState>>,
    Json(req): Json<BroadcastDeleteRequest>,
) -> (StatusCode, Json<AckResponse>) {
    match state.coordinator.broadcast_delete(&req.key).await {
        Ok(()) => (StatusCode::OK, Json(AckResponse { success: true })),
        Err(err) => {
            tracing::error!("Delete broadcast failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AckResponse { success: false }),
            )
        }
    }
}
