//! Local Store Module
//!
//! The in-memory key-value map owned by one participant process.
//!
//! ## Core Concepts
//! - **Concurrency**: `KeyValueStore` is safe for concurrent reads and writes;
//!   a participant serves coordinator broadcasts and independent GETs at once.
//! - **Persistence**: the map is serialized as a flat list of key/value pairs,
//!   loaded once at startup and rewritten when a client sends `STOP`.

pub mod memory;
pub mod persistence;

#[cfg(test)]
mod tests;
