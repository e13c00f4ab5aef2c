//! HTTP Handles
//!
//! The reqwest-backed implementations of the two remote seams:
//! `HttpParticipant` is the coordinator's handle to one participant process,
//! `HttpCoordinator` is a participant's link back to the coordinator.

use super::protocol::{
    BroadcastDeleteRequest, BroadcastPutRequest, ENDPOINT_BROADCAST_DELETE,
    ENDPOINT_BROADCAST_PREPARE, ENDPOINT_BROADCAST_PUT, ENDPOINT_REGISTER, RegisterRequest,
    RegisterResponse, RoundResponse,
};
use super::service::ParticipantHandle;
use crate::participant::protocol::{
    ApplyDeleteRequest, ApplyPutRequest, BusyResponse, ENDPOINT_APPLY_DELETE, ENDPOINT_APPLY_PUT,
    ENDPOINT_STATE_BUSY, ENDPOINT_STATE_IDLE, ENDPOINT_VOTE_COMMIT, ENDPOINT_VOTE_PREPARE,
    VoteResponse,
};
use crate::participant::service::CoordinatorLink;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;

/// Per-call timeout for flag accessors and apply operations.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for a whole prepare+commit round as seen by the participant that
/// initiated it: two vote phases plus transport overhead.
pub const ROUND_TIMEOUT: Duration = Duration::from_secs(30);

/// Coordinator-side handle to one participant process.
pub struct HttpParticipant {
    addr: SocketAddr,
    base_url: String,
    client: reqwest::Client,
}

impl HttpParticipant {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl ParticipantHandle for HttpParticipant {
    async fn is_busy(&self) -> Result<bool> {
        let response: BusyResponse = self
            .client
            .get(self.url(ENDPOINT_STATE_BUSY))
            .timeout(RPC_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.busy)
    }

    async fn ask_prepare(&self) -> Result<bool> {
        let response: VoteResponse = self
            .client
            .post(self.url(ENDPOINT_VOTE_PREPARE))
            .timeout(RPC_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.vote)
    }

    async fn ask_commit(&self) -> Result<bool> {
        let response: VoteResponse = self
            .client
            .post(self.url(ENDPOINT_VOTE_COMMIT))
            .timeout(RPC_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.vote)
    }

    async fn set_idle(&self) -> Result<()> {
        self.client
            .post(self.url(ENDPOINT_STATE_IDLE))
            .timeout(RPC_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.client
            .post(self.url(ENDPOINT_APPLY_PUT))
            .json(&ApplyPutRequest {
                key: key.to_string(),
                value: value.to_string(),
            })
            .timeout(RPC_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .post(self.url(ENDPOINT_APPLY_DELETE))
            .json(&ApplyDeleteRequest {
                key: key.to_string(),
            })
            .timeout(RPC_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.addr.to_string()
    }
}

/// Participant-side link to the coordinator process.
pub struct HttpCoordinator {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCoordinator {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Joins the coordinator's roster; returns the roster size afterwards.
    pub async fn register(&self, participant_addr: SocketAddr) -> Result<usize> {
        let response: RegisterResponse = self
            .client
            .post(self.url(ENDPOINT_REGISTER))
            .json(&RegisterRequest {
                addr: participant_addr,
            })
            .timeout(RPC_TIMEOUT)
            .send()
            .await
            .context("failed to reach coordinator for registration")?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.participants)
    }
}

#[async_trait]
impl CoordinatorLink for HttpCoordinator {
    async fn broadcast_prepare(&self) -> Result<bool> {
        let response: RoundResponse = self
            .client
            .post(self.url(ENDPOINT_BROADCAST_PREPARE))
            .timeout(ROUND_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.ok)
    }

    async fn broadcast_put(&self, key: &str, value: &str) -> Result<()> {
        self.client
            .post(self.url(ENDPOINT_BROADCAST_PUT))
            .json(&BroadcastPutRequest {
                key: key.to_string(),
                value: value.to_string(),
            })
            .timeout(ROUND_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn broadcast_delete(&self, key: &str) -> Result<()> {
        self.client
            .post(self.url(ENDPOINT_BROADCAST_DELETE))
            .json(&BroadcastDeleteRequest {
                key: key.to_string(),
            })
            .timeout(ROUND_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
