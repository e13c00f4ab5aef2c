//! Coordinator Module
//!
//! Drives the two-phase-commit protocol across all registered participants.
//!
//! ## Core Concepts
//! - **Roster**: an append-only list of participant handles, registered once
//!   at startup and snapshotted per round so one broadcast sees a stable
//!   membership.
//! - **Rounds**: each mutation runs a prepare vote round chained straight
//!   into a commit vote round; both are parallel fan-outs with a full join
//!   barrier and an unconditional idle reset per collected vote.
//! - **Gating**: the actual `put`/`delete` broadcast only ever runs after
//!   both rounds returned unanimous yes; a busy participant, a no vote, a
//!   timeout, or an unreachable participant aborts with no mutation anywhere.

pub mod client;
pub mod handlers;
pub mod protocol;
pub mod roster;
pub mod service;

#[cfg(test)]
mod tests;
