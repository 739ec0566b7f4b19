use crate::error::StoreError;

/// The coordination service as seen by the lock engine.
///
/// The production implementation wraps a live ZooKeeper session
/// ([`crate::zk::ZkStore`]); tests substitute an in-memory double. All
/// calls block. Implementations classify raw protocol errors into
/// [`StoreError`] so callers never branch on protocol codes.
pub trait CoordinationStore {
    /// Stable identity of the current session, used to tag candidate
    /// nodes with their owner.
    fn session_id(&self) -> u64;

    /// Whether a node exists at `path`.
    ///
    /// # Errors
    /// [`StoreError::Transient`] on connectivity flaps; other variants
    /// for unclassified failures. Plain absence is `Ok(false)`, not an
    /// error.
    fn exists(&self, path: &str) -> Result<bool, StoreError>;

    /// Creates a plain persistent node with no data.
    ///
    /// # Errors
    /// [`StoreError::AlreadyExists`] when another process won the race.
    fn create_persistent(&self, path: &str) -> Result<(), StoreError>;

    /// Creates an ephemeral, sequential child. `path_prefix` is the full
    /// path up to and including the name prefix; the store appends the
    /// sequence counter and returns the path as assigned.
    fn create_ephemeral_sequential(&self, path_prefix: &str) -> Result<String, StoreError>;

    /// Names of the children of `path`, in no particular order.
    fn children(&self, path: &str) -> Result<Vec<String>, StoreError>;
}
