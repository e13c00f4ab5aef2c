//! Vote Deciders
//!
//! A participant's yes/no answer to "are you prepared?" and "are you ready to
//! commit?" is delegated to an injected predicate. Production deployments
//! plug in a real readiness check (disk space, lock availability); tests plug
//! in scripted verdicts.

/// Which of the two protocol phases a vote is being cast for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotePhase {
    Prepare,
    Commit,
}

/// Readiness predicate consulted for each vote.
///
/// Must be cheap and non-blocking relative to the coordinator's vote timeout;
/// a decider that stalls longer than the timeout counts as a no vote.
pub trait VoteDecider: Send + Sync {
    fn decide(&self, phase: VotePhase) -> bool;
}

/// Default decider: always votes yes.
///
/// Stands in for a real readiness probe on deployments where a participant
/// that is reachable and idle is always able to apply a write.
pub struct AutoApprove;

impl VoteDecider for AutoApprove {
    fn decide(&self, _phase: VotePhase) -> bool {
        true
    }
}
