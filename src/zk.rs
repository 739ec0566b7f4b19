//! ZooKeeper-backed store adapter.
//!
//! Raw client errors are classified into [`StoreError`] here, at the
//! boundary, so the lock engine never branches on protocol codes.

use crate::error::StoreError;
use crate::store::CoordinationStore;
use rand::RngCore;
use std::time::Duration;
use tracing::{debug, info, warn};
use zookeeper::{Acl, CreateMode, WatchedEvent, Watcher, ZkError, ZkState, ZooKeeper};

struct EventLogger;

impl Watcher for EventLogger {
    fn handle(&self, event: WatchedEvent) {
        info!(event = ?event, "watched event");
    }
}

/// A live ZooKeeper session plus the identity used to tag candidates.
pub struct ZkStore {
    zk: ZooKeeper,
    session_id: u64,
}

impl ZkStore {
    /// Connects to `hosts` (comma-separated `host:port` list) and
    /// subscribes a listener that logs connection-state transitions.
    ///
    /// The client does not expose the negotiated wire session id, so a
    /// random 64-bit identity is drawn per connection. It is stable for
    /// the connection's lifetime, which is all the candidate prefix
    /// needs.
    ///
    /// # Errors
    /// A classified [`StoreError`] when the connection cannot be
    /// established or no OS randomness is available.
    pub fn connect(hosts: &str, session_timeout: Duration) -> Result<Self, StoreError> {
        let zk = ZooKeeper::connect(hosts, session_timeout, EventLogger).map_err(classify)?;
        let _ = zk.add_listener(|state: ZkState| match state {
            ZkState::Connected | ZkState::ConnectedReadOnly => {
                info!(?state, "connected");
            }
            ZkState::AuthFailed | ZkState::Closed => {
                warn!(?state, "session ended");
            }
            state => info!(?state, "connection state changed"),
        });

        let session_id = random_session_identity()?;
        debug!("session identity {session_id:016x}");
        Ok(Self { zk, session_id })
    }

    /// Closes the session, releasing any ephemeral candidate right away
    /// instead of waiting out the session timeout.
    ///
    /// # Errors
    /// A classified [`StoreError`]; callers may downgrade it, since
    /// expiry will release the candidate eventually anyway.
    pub fn close(self) -> Result<(), StoreError> {
        self.zk.close().map_err(classify)
    }
}

impl CoordinationStore for ZkStore {
    fn session_id(&self) -> u64 {
        self.session_id
    }

    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        match self.zk.exists(path, false) {
            Ok(stat) => Ok(stat.is_some()),
            Err(err) => Err(classify(err)),
        }
    }

    fn create_persistent(&self, path: &str) -> Result<(), StoreError> {
        self.zk
            .create(
                path,
                Vec::new(),
                Acl::open_unsafe().clone(),
                CreateMode::Persistent,
            )
            .map(|_| ())
            .map_err(classify)
    }

    fn create_ephemeral_sequential(&self, path_prefix: &str) -> Result<String, StoreError> {
        self.zk
            .create(
                path_prefix,
                Vec::new(),
                Acl::open_unsafe().clone(),
                CreateMode::EphemeralSequential,
            )
            .map_err(classify)
    }

    fn children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        self.zk.get_children(path, false).map_err(classify)
    }
}

fn random_session_identity() -> Result<u64, StoreError> {
    let mut raw = [0_u8; 8];
    rand::rngs::OsRng
        .try_fill_bytes(&mut raw)
        .map_err(|err| StoreError::Other(format!("read OS randomness: {err}")))?;
    Ok(u64::from_be_bytes(raw))
}

fn classify(err: ZkError) -> StoreError {
    match err {
        ZkError::ConnectionLoss | ZkError::OperationTimeout => StoreError::Transient,
        ZkError::NodeExists => StoreError::AlreadyExists,
        ZkError::NoNode => StoreError::NoNode,
        other => StoreError::Other(format!("{other:?}")),
    }
}
