//! Coordinator Module Tests
//!
//! Validates the broadcast/barrier protocol over in-process participant
//! handles, with scripted vote deciders standing in for readiness checks.
//!
//! ## Test Scopes
//! - **Roster**: registration, per-round membership snapshot.
//! - **Rounds**: unanimity, vetoes in either phase, busy fast-fail,
//!   unreachable participants, idle resets.
//! - **End-to-end**: full PUT/DELETE/GET scenarios through `handle_request`.

#[cfg(test)]
mod tests {
    use crate::coordinator::service::{Coordinator, ParticipantHandle};
    use crate::error::RequestError;
    use crate::participant::service::{CoordinatorLink, Participant};
    use crate::participant::vote::{AutoApprove, VoteDecider, VotePhase};
    use crate::store::memory::KeyValueStore;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Decider with fixed per-phase verdicts.
    struct Scripted {
        prepare: bool,
        commit: bool,
    }

    impl VoteDecider for Scripted {
        fn decide(&self, phase: VotePhase) -> bool {
            match phase {
                VotePhase::Prepare => self.prepare,
                VotePhase::Commit => self.commit,
            }
        }
    }

    /// In-process participant handle: a real `Participant` without the HTTP
    /// hop, counting how many vote calls actually reach it.
    struct LocalParticipant {
        name: &'static str,
        inner: Arc<Participant>,
        prepare_calls: AtomicUsize,
        commit_calls: AtomicUsize,
    }

    impl LocalParticipant {
        fn new(name: &'static str, inner: Arc<Participant>) -> Arc<Self> {
            Arc::new(Self {
                name,
                inner,
                prepare_calls: AtomicUsize::new(0),
                commit_calls: AtomicUsize::new(0),
            })
        }

        fn vote_calls(&self) -> (usize, usize) {
            (
                self.prepare_calls.load(Ordering::SeqCst),
                self.commit_calls.load(Ordering::SeqCst),
            )
        }
    }

    #[async_trait]
    impl ParticipantHandle for LocalParticipant {
        async fn is_busy(&self) -> Result<bool> {
            Ok(self.inner.is_busy())
        }

        async fn ask_prepare(&self) -> Result<bool> {
            self.prepare_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.inner.ask_prepare())
        }

        async fn ask_commit(&self) -> Result<bool> {
            self.commit_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.inner.ask_commit())
        }

        async fn set_idle(&self) -> Result<()> {
            self.inner.set_idle();
            Ok(())
        }

        async fn put(&self, key: &str, value: &str) -> Result<()> {
            self.inner.put(key, value);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.inner.delete(key)?;
            Ok(())
        }

        fn describe(&self) -> String {
            self.name.to_string()
        }
    }

    /// Handle whose every call fails, standing in for a dead process.
    struct UnreachableParticipant;

    #[async_trait]
    impl ParticipantHandle for UnreachableParticipant {
        async fn is_busy(&self) -> Result<bool> {
            // Reachable enough to pass the pre-check, dead at vote time
            Ok(false)
        }

        async fn ask_prepare(&self) -> Result<bool> {
            Err(anyhow::anyhow!("connection refused"))
        }

        async fn ask_commit(&self) -> Result<bool> {
            Err(anyhow::anyhow!("connection refused"))
        }

        async fn set_idle(&self) -> Result<()> {
            Err(anyhow::anyhow!("connection refused"))
        }

        async fn put(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow::anyhow!("connection refused"))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Err(anyhow::anyhow!("connection refused"))
        }

        fn describe(&self) -> String {
            "unreachable".to_string()
        }
    }

    /// Participant-side link to an in-process coordinator.
    struct LocalLink(Arc<Coordinator>);

    #[async_trait]
    impl CoordinatorLink for LocalLink {
        async fn broadcast_prepare(&self) -> Result<bool> {
            self.0.broadcast_prepare().await
        }

        async fn broadcast_put(&self, key: &str, value: &str) -> Result<()> {
            self.0.broadcast_put(key, value).await
        }

        async fn broadcast_delete(&self, key: &str) -> Result<()> {
            self.0.broadcast_delete(key).await
        }
    }

    /// Builds a coordinator with one registered participant per decider.
    async fn cluster(
        deciders: Vec<Arc<dyn VoteDecider>>,
    ) -> (Arc<Coordinator>, Vec<Arc<LocalParticipant>>) {
        const NAMES: [&str; 4] = ["p1", "p2", "p3", "p4"];

        let coordinator = Coordinator::new();
        let mut participants = Vec::new();
        for (i, decider) in deciders.into_iter().enumerate() {
            let inner = Participant::new(
                KeyValueStore::new(),
                decider,
                Arc::new(LocalLink(coordinator.clone())),
                None,
            );
            let local = LocalParticipant::new(NAMES[i], inner);
            coordinator
                .add_participant(local.clone() as Arc<dyn ParticipantHandle>)
                .await;
            participants.push(local);
        }
        (coordinator, participants)
    }

    fn all_yes(n: usize) -> Vec<Arc<dyn VoteDecider>> {
        (0..n)
            .map(|_| Arc::new(AutoApprove) as Arc<dyn VoteDecider>)
            .collect()
    }

    // ============================================================
    // ROSTER
    // ============================================================

    #[tokio::test]
    async fn test_roster_starts_empty_and_appends() {
        let coordinator = Coordinator::new();
        assert_eq!(coordinator.participant_count().await, 0);

        let (populated, _) = cluster(all_yes(3)).await;
        assert_eq!(populated.participant_count().await, 3);
    }

    // ============================================================
    // VOTE ROUNDS
    // ============================================================

    #[tokio::test]
    async fn test_unanimous_round_succeeds_single_participant() {
        let (coordinator, participants) = cluster(all_yes(1)).await;

        assert!(coordinator.broadcast_prepare().await.unwrap());
        assert_eq!(
            participants[0].vote_calls(),
            (1, 1),
            "Both phases should solicit exactly one vote"
        );
    }

    #[tokio::test]
    async fn test_unanimous_round_contacts_every_participant_once() {
        let (coordinator, participants) = cluster(all_yes(3)).await;

        assert!(coordinator.broadcast_prepare().await.unwrap());
        for participant in &participants {
            assert_eq!(participant.vote_calls(), (1, 1));
        }
    }

    #[tokio::test]
    async fn test_prepare_veto_fails_round_and_skips_commit_phase() {
        let (coordinator, participants) = cluster(vec![
            Arc::new(AutoApprove),
            Arc::new(Scripted {
                prepare: false,
                commit: true,
            }),
        ])
        .await;

        assert!(!coordinator.broadcast_prepare().await.unwrap());

        // Everyone was asked to prepare, nobody was asked to commit
        assert_eq!(participants[0].vote_calls(), (1, 0));
        assert_eq!(participants[1].vote_calls(), (1, 0));
    }

    #[tokio::test]
    async fn test_commit_veto_fails_round() {
        let (coordinator, participants) = cluster(vec![
            Arc::new(AutoApprove),
            Arc::new(Scripted {
                prepare: true,
                commit: false,
            }),
        ])
        .await;

        assert!(!coordinator.broadcast_prepare().await.unwrap());
        assert_eq!(
            participants[1].vote_calls(),
            (1, 1),
            "The veto only shows up in phase 2"
        );
    }

    #[tokio::test]
    async fn test_busy_participant_fails_fast_without_any_vote_calls() {
        let (coordinator, participants) = cluster(all_yes(2)).await;

        participants[1].inner.set_busy();

        assert!(!coordinator.broadcast_prepare().await.unwrap());
        assert_eq!(
            participants[0].vote_calls(),
            (0, 0),
            "The busy pre-check must abort before any vote call goes out"
        );
        assert_eq!(participants[1].vote_calls(), (0, 0));
    }

    #[tokio::test]
    async fn test_participants_idle_after_successful_round() {
        let (coordinator, participants) = cluster(all_yes(3)).await;

        assert!(coordinator.broadcast_prepare().await.unwrap());
        for participant in &participants {
            assert!(
                !participant.inner.is_busy(),
                "{} should end the round IDLE",
                participant.describe()
            );
        }
    }

    #[tokio::test]
    async fn test_participants_idle_after_failed_round() {
        let (coordinator, participants) = cluster(vec![
            Arc::new(AutoApprove),
            Arc::new(Scripted {
                prepare: false,
                commit: true,
            }),
        ])
        .await;

        assert!(!coordinator.broadcast_prepare().await.unwrap());
        for participant in &participants {
            assert!(
                !participant.inner.is_busy(),
                "The idle reset is unconditional, win or lose"
            );
        }
    }

    #[tokio::test]
    async fn test_unreachable_participant_fails_round_and_resets_the_rest() {
        let (coordinator, participants) = cluster(all_yes(2)).await;
        coordinator
            .add_participant(Arc::new(UnreachableParticipant))
            .await;

        assert!(
            !coordinator.broadcast_prepare().await.unwrap(),
            "An unreachable participant counts as a no vote, not a crash"
        );
        for participant in &participants {
            assert!(
                !participant.inner.is_busy(),
                "Reachable participants must still be reset to idle"
            );
        }
    }

    #[tokio::test]
    async fn test_standalone_commit_round() {
        let (coordinator, participants) = cluster(all_yes(2)).await;

        assert!(coordinator.broadcast_commit().await.unwrap());
        for participant in &participants {
            assert_eq!(participant.vote_calls(), (0, 1));
        }
    }

    // ============================================================
    // MUTATION BROADCASTS
    // ============================================================

    #[tokio::test]
    async fn test_broadcast_put_reaches_every_store() {
        let (coordinator, participants) = cluster(all_yes(3)).await;

        coordinator.broadcast_put("k1", "v1").await.unwrap();
        for participant in &participants {
            assert_eq!(participant.inner.get("k1").unwrap(), "v1");
        }
    }

    #[tokio::test]
    async fn test_broadcast_delete_reaches_every_store() {
        let (coordinator, participants) = cluster(all_yes(2)).await;
        coordinator.broadcast_put("k1", "v1").await.unwrap();

        coordinator.broadcast_delete("k1").await.unwrap();
        for participant in &participants {
            assert!(participant.inner.get("k1").is_err());
        }
    }

    #[tokio::test]
    async fn test_broadcast_delete_missing_key_reports_failures() {
        let (coordinator, _participants) = cluster(all_yes(2)).await;

        assert!(
            coordinator.broadcast_delete("never-written").await.is_err(),
            "Per-participant NotFound failures fold into the broadcast result"
        );
    }

    // ============================================================
    // END-TO-END SCENARIOS
    // ============================================================

    #[tokio::test]
    async fn test_put_scenario_applies_everywhere() {
        let (_coordinator, participants) = cluster(all_yes(2)).await;

        let response = participants[0]
            .inner
            .handle_request("PUT\tk1\tv1")
            .await
            .unwrap();
        assert_eq!(response, "Put successful");

        // The write is visible on every participant, not just the origin
        assert_eq!(participants[0].inner.get("k1").unwrap(), "v1");
        assert_eq!(participants[1].inner.get("k1").unwrap(), "v1");
    }

    #[tokio::test]
    async fn test_put_scenario_aborts_when_one_participant_votes_no() {
        let (_coordinator, participants) = cluster(vec![
            Arc::new(AutoApprove),
            Arc::new(Scripted {
                prepare: false,
                commit: true,
            }),
        ])
        .await;

        let result = participants[0].inner.handle_request("PUT\tk1\tv1").await;
        assert!(matches!(result, Err(RequestError::TransactionAborted)));

        // The key never existed anywhere
        for participant in &participants {
            let get = participant.inner.handle_request("GET\tk1").await;
            assert!(matches!(get, Err(RequestError::NotFound { .. })));
        }
    }

    #[tokio::test]
    async fn test_delete_scenario_removes_key_everywhere() {
        let (_coordinator, participants) = cluster(all_yes(2)).await;

        participants[0]
            .inner
            .handle_request("PUT\tk1\tv1")
            .await
            .unwrap();
        let response = participants[1]
            .inner
            .handle_request("DELETE\tk1")
            .await
            .unwrap();
        assert_eq!(response, "Delete successful");

        for participant in &participants {
            let get = participant.inner.handle_request("GET\tk1").await;
            assert!(matches!(get, Err(RequestError::NotFound { .. })));
        }
    }

    #[tokio::test]
    async fn test_write_then_read_from_any_participant() {
        let (_coordinator, participants) = cluster(all_yes(3)).await;

        participants[2]
            .inner
            .handle_request("PUT\tshared\tstate")
            .await
            .unwrap();

        for participant in &participants {
            assert_eq!(
                participant.inner.handle_request("GET\tshared").await.unwrap(),
                "state"
            );
        }
    }

    #[tokio::test]
    async fn test_consecutive_rounds_on_the_same_roster() {
        let (_coordinator, participants) = cluster(all_yes(2)).await;

        participants[0]
            .inner
            .handle_request("PUT\tk1\tfirst")
            .await
            .unwrap();
        participants[0]
            .inner
            .handle_request("PUT\tk1\tsecond")
            .await
            .unwrap();

        assert_eq!(participants[1].inner.get("k1").unwrap(), "second");
        assert_eq!(
            participants[0].vote_calls(),
            (2, 2),
            "Each round solicits a fresh pair of votes"
        );
    }
}
