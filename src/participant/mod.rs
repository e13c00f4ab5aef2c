//! Participant Module
//!
//! The vote-yielding side of the two-phase-commit protocol.
//!
//! ## Core Concepts
//! - **State machine**: each participant owns one `{IDLE, BUSY}` flag. It goes
//!   `BUSY` when casting a prepare vote and is reset to `IDLE` by the
//!   coordinator once that vote has been collected, win or lose.
//! - **Votes**: prepare/commit verdicts come from a pluggable `VoteDecider`
//!   (a readiness predicate), never from the protocol machinery itself.
//! - **Dispatch**: `handle_request` turns one tab-separated client command
//!   into local reads or coordinator-driven mutation rounds.

pub mod handlers;
pub mod protocol;
pub mod service;
pub mod vote;
