use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use std::sync::Arc;

use super::protocol::{
    AckResponse, ApplyDeleteRequest, ApplyPutRequest, BusyResponse, CommandRequest,
    CommandResponse, GetValueResponse, VoteResponse,
};
use super::service::Participant;
use crate::error::RequestError;

/// Client-facing gateway: runs one tab-separated command and returns its
/// single response line.
pub async fn handle_command(
    Extension(participant): Extension<Arc<Participant>>,
    Json(req): Json<CommandRequest>,
) -> (StatusCode, Json<CommandResponse>) {
    match participant.handle_request(&req.command).await {
        Ok(response) => (
            StatusCode::OK,
            Json(CommandResponse {
                response: Some(response),
                error: None,
            }),
        ),
        Err(err) => {
            tracing::warn!("Request failed: {}", err);
            (
                status_for(&err),
                Json(CommandResponse {
                    response: None,
                    error: Some(err.to_string()),
                }),
            )
        }
    }
}

fn status_for(err: &RequestError) -> StatusCode {
    match err {
        RequestError::NotFound { .. } => StatusCode::NOT_FOUND,
        RequestError::InvalidCommand { .. } | RequestError::InvalidArgumentCount { .. } => {
            StatusCode::BAD_REQUEST
        }
        RequestError::TransactionAborted => StatusCode::CONFLICT,
        RequestError::Coordinator(_) | RequestError::Persistence(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub async fn handle_vote_prepare(
    Extension(participant): Extension<Arc<Participant>>,
) -> (StatusCode, Json<VoteResponse>) {
    let vote = participant.ask_prepare();
    (StatusCode::OK, Json(VoteResponse { vote }))
}

pub async fn handle_vote_commit(
    Extension(participant): Extension<Arc<Participant>>,
) -> (StatusCode, Json<VoteResponse>) {
    let vote = participant.ask_commit();
    (StatusCode::OK, Json(VoteResponse { vote }))
}

/// Direct local read; never blocked by an in-flight transaction.
pub async fn handle_get(
    Extension(participant): Extension<Arc<Participant>>,
    Path(key): Path<String>,
) -> (StatusCode, Json<GetValueResponse>) {
    match participant.get(&key) {
        Ok(value) => (
            StatusCode::OK,
            Json(GetValueResponse { value: Some(value) }),
        ),
        Err(_) => (StatusCode::NOT_FOUND, Json(GetValueResponse { value: None })),
    }
}

/// Post-commit write from the coordinator. Unconditional apply; no vote.
pub async fn handle_apply_put(
    Extension(participant): Extension<Arc<Participant>>,
    Json(req): Json<ApplyPutRequest>,
) -> (StatusCode, Json<AckResponse>) {
    participant.put(&req.key, &req.value);
    (StatusCode::OK, Json(AckResponse { success: true }))
}

/// Post-commit removal from the coordinator.
pub async fn handle_apply_delete(
    Extension(participant): Extension<Arc<Participant>>,
    Json(req): Json<ApplyDeleteRequest>,
) -> (StatusCode, Json<AckResponse>) {
    match participant.delete(&req.key) {
        Ok(()) => (StatusCode::OK, Json(AckResponse { success: true })),
        Err(err) => {
            tracing::warn!("Apply delete failed: {}", err);
            (StatusCode::NOT_FOUND, Json(AckResponse { success: false }))
        }
    }
}

pub async fn handle_get_busy(
    Extension(participant): Extension<Arc<Participant>>,
) -> (StatusCode, Json<BusyResponse>) {
    (
        StatusCode::OK,
        Json(BusyResponse {
            busy: participant.is_busy(),
        }),
    )
}

pub async fn handle_set_busy(
    Extension(participant): Extension<Arc<Participant>>,
) -> (StatusCode, Json<AckResponse>) {
    participant.set_busy();
    (StatusCode::OK, Json(AckResponse { success: true }))
}

pub async fn handle_set_idle(
    Extension(participant): Extension<Arc<Participant>>,
) -> (StatusCode, Json<AckResponse>) {
    participant.set_idle();
    (StatusCode::OK, Json(AckResponse { success: true }))
}
