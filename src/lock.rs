use crate::candidate;
use crate::error::{LockError, StoreError};
use crate::ordering;
use crate::store::CoordinationStore;
use std::thread::sleep;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_MAX_RETRIES: u32 = 5;
const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Retry policy shared by the bootstrap, enumeration, and decision loops.
#[derive(Debug, Clone, Copy)]
pub struct LockConfig {
    /// Retry budget for each bounded loop.
    pub max_retries: u32,
    /// Fixed delay before each retry.
    pub retry_delay: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

/// Terminal result of one try-lock run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome {
    /// This session owns the lock; `candidate` is its node name.
    Acquired {
        /// Our candidate node name.
        candidate: String,
    },
    /// Another session is ahead of ours; the run must not proceed.
    Blocked {
        /// Full path of the candidate directly ahead of ours.
        holder: String,
    },
}

/// Makes sure the lock directory exists, creating it if needed.
///
/// Losing the creation race to another process still counts as success.
/// Transient trouble is retried within the budget; anything else is
/// fatal, since nothing can be locked without the directory.
///
/// # Errors
/// [`LockError::Directory`] on budget exhaustion or an unclassified
/// store failure.
pub fn ensure_path(
    store: &impl CoordinationStore,
    path: &str,
    cfg: LockConfig,
) -> Result<(), LockError> {
    for attempt in 0..=cfg.max_retries {
        if attempt > 0 {
            sleep(cfg.retry_delay);
        }
        match store.exists(path) {
            Ok(true) => return Ok(()),
            Ok(false) => match store.create_persistent(path) {
                Ok(()) | Err(StoreError::AlreadyExists) => return Ok(()),
                Err(StoreError::Transient) => {
                    warn!(path, attempt, "transient failure creating lock directory");
                }
                Err(err) => {
                    return Err(LockError::Directory {
                        path: path.to_string(),
                        source: err,
                    })
                }
            },
            Err(StoreError::Transient) => {
                warn!(path, attempt, "transient failure checking lock directory");
            }
            Err(err) => {
                return Err(LockError::Directory {
                    path: path.to_string(),
                    source: err,
                })
            }
        }
    }

    Err(LockError::Directory {
        path: path.to_string(),
        source: StoreError::Transient,
    })
}

/// Lists the children of `path`, retrying transient failures up to the
/// budget with the fixed delay. Any other error is returned immediately.
///
/// # Errors
/// The last [`StoreError::Transient`] once the budget is spent, or the
/// first unclassified failure.
pub fn children_with_retry(
    store: &impl CoordinationStore,
    path: &str,
    cfg: LockConfig,
) -> Result<Vec<String>, StoreError> {
    let mut attempt: u32 = 0;
    loop {
        match store.children(path) {
            Ok(children) => return Ok(children),
            Err(StoreError::Transient) if attempt < cfg.max_retries => {
                attempt = attempt.saturating_add(1);
                debug!(path, attempt, "transient failure listing candidates, retrying");
                sleep(cfg.retry_delay);
            }
            Err(err) => return Err(err),
        }
    }
}

/// Decision for one freshly sorted candidate set.
///
/// No predecessor means ours is the minimum sequence number and the lock
/// is acquired. A candidate with no predecessor that is not the minimum
/// indicates a corrupted ordering and fails the run.
///
/// # Errors
/// [`LockError::OrderViolation`] on the sanity breach above, or a
/// malformed-name error from the suffix validation.
pub fn decide(sorted: &[String], mine: &str, path: &str) -> Result<LockOutcome, LockError> {
    match ordering::floor(sorted, mine)? {
        Some(holder) => Ok(LockOutcome::Blocked {
            holder: format!("{path}/{holder}"),
        }),
        None => {
            if sorted.first().map(String::as_str) == Some(mine) {
                Ok(LockOutcome::Acquired {
                    candidate: mine.to_string(),
                })
            } else {
                Err(LockError::OrderViolation {
                    path: path.to_string(),
                    name: mine.to_string(),
                })
            }
        }
    }
}

fn enumerate(
    store: &impl CoordinationStore,
    path: &str,
    cfg: LockConfig,
) -> Result<Option<Vec<String>>, LockError> {
    match children_with_retry(store, path, cfg) {
        Ok(children) => Ok(Some(children)),
        // Spent budget on connectivity; the attempt is lost, not the run.
        Err(StoreError::Transient) => Ok(None),
        Err(err) => Err(LockError::Store {
            op: "list children of",
            path: path.to_string(),
            source: err,
        }),
    }
}

/// Runs the try-lock protocol against `path` until a terminal outcome.
///
/// One iteration registers (or rediscovers) this session's candidate,
/// takes a fresh snapshot of its siblings, and decides. Both decisions
/// are terminal: acquired proceeds, blocked reports the holder and
/// stops. Create failures and transient enumeration failures consume an
/// iteration and loop.
///
/// # Errors
/// [`LockError::Directory`] if the directory cannot be ensured,
/// [`LockError::Exhausted`] when the budget runs out, and fatal
/// pass-throughs for unclassified store failures or malformed candidate
/// names.
pub fn try_lock(
    store: &impl CoordinationStore,
    path: &str,
    cfg: LockConfig,
) -> Result<LockOutcome, LockError> {
    ensure_path(store, path, cfg)?;

    let mut attempt: u32 = 0;
    while attempt < cfg.max_retries {
        sleep(cfg.retry_delay);
        attempt = attempt.saturating_add(1);

        let Some(probe) = enumerate(store, path, cfg)? else {
            warn!(path, attempt, "could not enumerate candidates");
            continue;
        };

        let mine = match candidate::resolve(store, path, &probe) {
            Ok(name) => name,
            Err(err) => {
                warn!(path, attempt, error = %err, "could not register candidate");
                continue;
            }
        };

        let Some(fresh) = enumerate(store, path, cfg)? else {
            warn!(path, attempt, "could not enumerate candidates");
            continue;
        };

        let sorted = ordering::sort_by_sequence(fresh)?;
        return decide(&sorted, &mine, path);
    }

    Err(LockError::Exhausted {
        path: path.to_string(),
    })
}
