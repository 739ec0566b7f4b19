//! `zklock` is a small library backing the `zklock` CLI binary.
//!
//! It implements the classic ZooKeeper try-lock recipe so that exclusive
//! cron-style jobs on independent hosts can agree on a single winner:
//! - Ensure the lock directory exists (idempotent under races)
//! - Register an ephemeral, sequential candidate node for this session
//! - Enumerate the candidates and sort them by sequence suffix
//! - Acquire if ours is the minimum, otherwise report the holder and stop

/// Candidate registration keyed by session identity.
pub mod candidate;
/// Error taxonomy shared by the store adapter and the lock engine.
pub mod error;
/// Try-lock engine: directory bootstrap, bounded retries, decision loop.
pub mod lock;
/// Candidate-name ordering: sequence suffixes, sorting, floor computation.
pub mod ordering;
/// Coordination-store interface consumed by the lock engine.
pub mod store;
/// ZooKeeper-backed implementation of the store interface.
pub mod zk;
