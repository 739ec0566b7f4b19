use thiserror::Error;

/// Store-level failures, classified at the client boundary.
///
/// The lock engine never sees raw protocol codes; the adapter in
/// [`crate::zk`] folds them into these categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Connectivity flap that may heal on its own; safe to retry within a
    /// bounded budget.
    #[error("transient connection loss")]
    Transient,
    /// The node already exists.
    #[error("node already exists")]
    AlreadyExists,
    /// The node does not exist.
    #[error("no such node")]
    NoNode,
    /// Anything the adapter could not classify. Never retried.
    #[error("{0}")]
    Other(String),
}

/// Fatal conditions that end a lock run.
///
/// Being blocked by another holder is not an error; that is reported
/// through [`crate::lock::LockOutcome`] instead.
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock directory could not be created or verified.
    #[error("could not create lock directory {path}: {source}")]
    Directory {
        /// The lock directory path.
        path: String,
        /// The last store failure observed.
        source: StoreError,
    },
    /// The retry budget ran out before reaching a terminal decision.
    #[error("too many retries while trying to lock {path}")]
    Exhausted {
        /// The lock directory path.
        path: String,
    },
    /// A child name under the lock directory does not follow the
    /// `<prefix>-<zero-padded-sequence>` contract.
    #[error("malformed candidate name {name:?}")]
    MalformedCandidate {
        /// The offending child name.
        name: String,
    },
    /// A candidate with no predecessor must be the minimum of its set.
    #[error("candidate {name} has no predecessor but is not first in {path}")]
    OrderViolation {
        /// The lock directory path.
        path: String,
        /// Our candidate name.
        name: String,
    },
    /// An unclassified store failure.
    #[error("{op} {path}: {source}")]
    Store {
        /// The operation that failed.
        op: &'static str,
        /// The path it was issued against.
        path: String,
        /// The classified failure.
        source: StoreError,
    },
}
