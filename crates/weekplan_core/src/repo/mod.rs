//! Key-value persistence behind the planner store.
//!
//! # Responsibility
//! - Define the string-keyed storage contract the planner store writes
//!   through (the local-storage shape: one text value per key).
//! - Isolate SQLite details from the store.
//!
//! # Invariants
//! - `set` replaces the full value of a key atomically.
//! - `get` of an unknown key is `Ok(None)`, never an error.

pub mod kv_repo;
