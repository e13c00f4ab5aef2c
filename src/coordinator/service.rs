use crate::participant::vote::VotePhase;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Upper bound on one vote call. A participant that does not answer within
/// this window counts as a no vote, so a hung participant aborts the round
/// instead of wedging the coordinator.
pub const VOTE_TIMEOUT: Duration = Duration::from_secs(5);

/// The coordinator's remote handle to one participant.
///
/// Implemented by `HttpParticipant` for real deployments and by in-process
/// doubles in tests. Every method crosses a process boundary and can fail;
/// failures during a round fold into that round's outcome, never a panic.
#[async_trait]
pub trait ParticipantHandle: Send + Sync {
    async fn is_busy(&self) -> Result<bool>;
    async fn ask_prepare(&self) -> Result<bool>;
    async fn ask_commit(&self) -> Result<bool>;
    async fn set_idle(&self) -> Result<()>;
    async fn put(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    /// Short label for log lines, typically the participant's address.
    fn describe(&self) -> String;
}

/// Drives 2PC rounds across the roster of registered participants.
pub struct Coordinator {
    roster: RwLock<Vec<Arc<dyn ParticipantHandle>>>,
}

impl Coordinator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            roster: RwLock::new(Vec::new()),
        })
    }

    /// Appends to the roster. No dedup, no removal; participants register
    /// once at startup and stay for the process lifetime.
    pub async fn add_participant(&self, participant: Arc<dyn ParticipantHandle>) {
        let mut roster = self.roster.write().await;
        roster.push(participant);
        tracing::info!("Added participant ({} registered)", roster.len());
    }

    pub async fn participant_count(&self) -> usize {
        self.roster.read().await.len()
    }

    /// Stable membership view for the duration of one broadcast.
    async fn roster_snapshot(&self) -> Vec<Arc<dyn ParticipantHandle>> {
        self.roster.read().await.clone()
    }

    /// Phase 1, chaining into phase 2. Returns `true` only if every
    /// participant voted yes in both phases; there is no caller-visible
    /// window between a unanimous prepare and the commit round.
    pub async fn broadcast_prepare(&self) -> Result<bool> {
        let round = Uuid::new_v4();
        tracing::info!("Round {}: starting prepare phase", round);

        if !self.run_vote_round(VotePhase::Prepare, round).await {
            tracing::warn!("Round {}: a participant failed to prepare", round);
            return Ok(false);
        }

        tracing::info!("Round {}: prepare unanimous, starting commit phase", round);
        if !self.run_vote_round(VotePhase::Commit, round).await {
            tracing::warn!("Round {}: a participant failed to commit", round);
            return Ok(false);
        }

        tracing::info!("Round {}: committed", round);
        Ok(true)
    }

    /// Phase 2 on its own: same pre-check/fan-out/join/reset shape as phase 1
    /// but soliciting commit votes.
    pub async fn broadcast_commit(&self) -> Result<bool> {
        Ok(self.run_vote_round(VotePhase::Commit, Uuid::new_v4()).await)
    }

    /// One vote-collection round: sequential busy pre-check, then a parallel
    /// vote fan-out with a full join barrier, resetting each participant to
    /// idle as its vote is collected. Returns the AND of all votes.
    async fn run_vote_round(&self, phase: VotePhase, round: Uuid) -> bool {
        let roster = self.roster_snapshot().await;

        // Fast-fail pre-check: a busy (or unreachable) participant aborts the
        // whole round before any vote call goes out.
        for participant in &roster {
            match participant.is_busy().await {
                Ok(false) => {}
                Ok(true) => {
                    tracing::warn!(
                        "Round {}: participant {} is busy, aborting",
                        round,
                        participant.describe()
                    );
                    return false;
                }
                Err(err) => {
                    tracing::warn!(
                        "Round {}: busy check failed for {}: {}",
                        round,
                        participant.describe(),
                        err
                    );
                    return false;
                }
            }
        }

        // Fan-out: one task per participant, no ordering between them. Every
        // participant is contacted; nothing short-circuits on a no vote.
        let mut tasks = Vec::with_capacity(roster.len());
        for (index, participant) in roster.iter().enumerate() {
            let participant = participant.clone();
            tasks.push((
                index,
                tokio::spawn(async move { solicit_vote(participant, phase).await }),
            ));
        }

        // Join barrier: collect every vote into its roster slot, resetting
        // the participant to idle as its vote lands, win or lose.
        let mut votes = vec![false; roster.len()];
        for (index, task) in tasks {
            votes[index] = match task.await {
                Ok(vote) => vote,
                Err(err) => {
                    tracing::error!(
                        "Round {}: vote task for {} panicked: {}",
                        round,
                        roster[index].describe(),
                        err
                    );
                    false
                }
            };

            if let Err(err) = roster[index].set_idle().await {
                tracing::warn!(
                    "Round {}: failed to reset {} to idle: {}",
                    round,
                    roster[index].describe(),
                    err
                );
            }
        }

        votes.iter().all(|vote| *vote)
    }

    /// Unconditional write fan-out, only ever called after a unanimous
    /// commit decision. Every participant is contacted; failures are folded
    /// into the returned error after the join barrier.
    pub async fn broadcast_put(&self, key: &str, value: &str) -> Result<()> {
        let roster = self.roster_snapshot().await;
        tracing::info!("Broadcasting put '{}' to {} participants", key, roster.len());

        let mut tasks = Vec::with_capacity(roster.len());
        for participant in &roster {
            let participant = participant.clone();
            let key = key.to_string();
            let value = value.to_string();
            tasks.push(tokio::spawn(async move {
                participant
                    .put(&key, &value)
                    .await
                    .map_err(|err| format!("{}: {}", participant.describe(), err))
            }));
        }

        join_apply_tasks(tasks, "put").await
    }

    /// Symmetric to [`broadcast_put`](Self::broadcast_put).
    pub async fn broadcast_delete(&self, key: &str) -> Result<()> {
        let roster = self.roster_snapshot().await;
        tracing::info!(
            "Broadcasting delete '{}' to {} participants",
            key,
            roster.len()
        );

        let mut tasks = Vec::with_capacity(roster.len());
        for participant in &roster {
            let participant = participant.clone();
            let key = key.to_string();
            tasks.push(tokio::spawn(async move {
                participant
                    .delete(&key)
                    .await
                    .map_err(|err| format!("{}: {}", participant.describe(), err))
            }));
        }

        join_apply_tasks(tasks, "delete").await
    }
}

/// One vote call with its timeout. Transport errors and timeouts count as a
/// no vote, never a crash of the round.
async fn solicit_vote(participant: Arc<dyn ParticipantHandle>, phase: VotePhase) -> bool {
    let call = async {
        match phase {
            VotePhase::Prepare => participant.ask_prepare().await,
            VotePhase::Commit => participant.ask_commit().await,
        }
    };

    match tokio::time::timeout(VOTE_TIMEOUT, call).await {
        Ok(Ok(vote)) => vote,
        Ok(Err(err)) => {
            tracing::warn!(
                "Vote call to {} failed: {}; counting as no",
                participant.describe(),
                err
            );
            false
        }
        Err(_) => {
            tracing::warn!(
                "Vote call to {} timed out after {:?}; counting as no",
                participant.describe(),
                VOTE_TIMEOUT
            );
            false
        }
    }
}

async fn join_apply_tasks(
    tasks: Vec<tokio::task::JoinHandle<Result<(), String>>>,
    operation: &str,
) -> Result<()> {
    let mut failures = Vec::new();
    for task in tasks {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(failure)) => failures.push(failure),
            Err(err) => failures.push(format!("apply task panicked: {}", err)),
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "{} broadcast failed on {} participant(s): {}",
            operation,
            failures.len(),
            failures.join("; ")
        ))
    }
}
