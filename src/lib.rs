//! Distributed Two-Phase-Commit Key-Value Store Library
//!
//! This library crate defines the core modules that make up the replicated store.
//! It serves as the foundation for the binary executable (`main.rs`), which runs
//! either a coordinator process, a participant process, or an interactive client.
//!
//! ## Architecture Modules
//! The system is composed of three loosely coupled subsystems:
//!
//! - **`store`**: The local state layer. An in-memory, concurrency-safe
//!   string-to-string map owned by one participant, with JSON snapshot
//!   persistence (loaded at startup, written on `STOP`).
//! - **`participant`**: The vote-yielding side of the protocol. Wraps a
//!   `KeyValueStore`, tracks a busy/idle flag, answers prepare/commit votes
//!   through a pluggable readiness predicate, and dispatches tab-separated
//!   client commands (GET/PUT/DELETE/STOP).
//! - **`coordinator`**: The protocol driver. Holds the roster of registered
//!   participants and runs each mutation as a prepare round chained into a
//!   commit round (parallel fan-out, join barrier, unconditional idle reset),
//!   only broadcasting the actual write after two unanimous rounds.

pub mod coordinator;
pub mod error;
pub mod participant;
pub mod store;
