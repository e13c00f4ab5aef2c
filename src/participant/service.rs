use super::vote::{VoteDecider, VotePhase};
use crate::error::{RequestError, StoreError};
use crate::store::memory::KeyValueStore;
use crate::store::persistence::save_snapshot;

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The participant's view of its coordinator.
///
/// Implemented by `HttpCoordinator` for real deployments and by in-process
/// wrappers in tests. `broadcast_prepare` transitively runs both protocol
/// phases; the mutation broadcasts are only called after it returns `true`.
#[async_trait]
pub trait CoordinatorLink: Send + Sync {
    async fn broadcast_prepare(&self) -> Result<bool>;
    async fn broadcast_put(&self, key: &str, value: &str) -> Result<()>;
    async fn broadcast_delete(&self, key: &str) -> Result<()>;
}

/// One participant process: a local store, a busy/idle flag, a vote
/// predicate, and a link back to the coordinator for mutating commands.
pub struct Participant {
    store: KeyValueStore,
    busy: AtomicBool,
    decider: Arc<dyn VoteDecider>,
    coordinator: Arc<dyn CoordinatorLink>,
    /// Snapshot destination for STOP. `None` disables persistence.
    data_path: Option<PathBuf>,
}

impl Participant {
    pub fn new(
        store: KeyValueStore,
        decider: Arc<dyn VoteDecider>,
        coordinator: Arc<dyn CoordinatorLink>,
        data_path: Option<PathBuf>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            busy: AtomicBool::new(false),
            decider,
            coordinator,
            data_path,
        })
    }

    // --- Busy/idle flag ---
    //
    // Bare accessors with no validation; the coordinator owns the sequencing
    // and resets every contacted participant after each round.

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn set_idle(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn set_busy(&self) {
        self.busy.store(true, Ordering::Release);
    }

    // --- Votes ---

    /// Phase-1 vote. A busy participant refuses immediately without
    /// consulting the decider; otherwise the IDLE -> BUSY transition and the
    /// vote attempt are a single compare-exchange, so two concurrent rounds
    /// cannot both get a vote out of this participant.
    pub fn ask_prepare(&self) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!("Refusing prepare vote: already part of an ongoing transaction");
            return false;
        }

        let vote = self.decider.decide(VotePhase::Prepare);
        tracing::info!("Prepare vote cast: {}", vote);
        vote
    }

    /// Phase-2 vote. Does not touch the busy flag.
    pub fn ask_commit(&self) -> bool {
        let vote = self.decider.decide(VotePhase::Commit);
        tracing::info!("Commit vote cast: {}", vote);
        vote
    }

    // --- Local store access ---
    //
    // `put`/`delete` are only ever invoked by the coordinator after a
    // unanimous commit decision, never speculatively. Reads are local and
    // never blocked by an in-flight transaction.

    pub fn get(&self, key: &str) -> Result<String, StoreError> {
        self.store.get(key)
    }

    pub fn put(&self, key: &str, value: &str) {
        self.store.put(key, value);
    }

    pub fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.store.delete(key)
    }

    pub fn store(&self) -> &KeyValueStore {
        &self.store
    }

    // --- Client command dispatch ---

    /// Handles one tab-separated client command and returns the single
    /// response line. Runs of tabs collapse; the verb is case-insensitive.
    pub async fn handle_request(&self, command: &str) -> Result<String, RequestError> {
        let tokens: Vec<&str> = command
            .split('\t')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect();

        let verb = tokens
            .first()
            .map(|token| token.to_uppercase())
            .unwrap_or_default();

        match verb.as_str() {
            "GET" => {
                validate_arg_count(&tokens, "GET", 2)?;
                Ok(self.get(tokens[1])?)
            }

            "PUT" => {
                validate_arg_count(&tokens, "PUT", 3)?;
                let (key, value) = (tokens[1], tokens[2]);
                if self.run_round().await? {
                    self.coordinator
                        .broadcast_put(key, value)
                        .await
                        .map_err(RequestError::Coordinator)?;
                    Ok("Put successful".to_string())
                } else {
                    Err(RequestError::TransactionAborted)
                }
            }

            "DELETE" => {
                validate_arg_count(&tokens, "DELETE", 2)?;
                let key = tokens[1];
                if self.run_round().await? {
                    self.coordinator
                        .broadcast_delete(key)
                        .await
                        .map_err(RequestError::Coordinator)?;
                    Ok("Delete successful".to_string())
                } else {
                    Err(RequestError::TransactionAborted)
                }
            }

            "STOP" => {
                validate_arg_count(&tokens, "STOP", 1)?;
                if let Some(path) = &self.data_path {
                    save_snapshot(path, &self.store).map_err(RequestError::Persistence)?;
                }
                Ok("Disconnected client".to_string())
            }

            _ => Err(RequestError::InvalidCommand { verb }),
        }
    }

    /// Runs the full prepare+commit round through the coordinator.
    async fn run_round(&self) -> Result<bool, RequestError> {
        self.coordinator
            .broadcast_prepare()
            .await
            .map_err(RequestError::Coordinator)
    }
}

fn validate_arg_count(
    tokens: &[&str],
    verb: &'static str,
    expected_tokens: usize,
) -> Result<(), RequestError> {
    if tokens.len() != expected_tokens {
        return Err(RequestError::InvalidArgumentCount {
            verb,
            // The verb itself is not an argument
            expected: expected_tokens - 1,
        });
    }
    Ok(())
}
