use crate::error::StoreError;
use crate::store::CoordinationStore;
use tracing::debug;

/// Candidate name prefix for a session: `x-` plus 16 hex digits plus `-`.
///
/// The fixed width keeps the prefix self-delimiting, so the sequence
/// suffix is always the part after the last `-`.
#[must_use]
pub fn session_prefix(session_id: u64) -> String {
    format!("x-{session_id:016x}-")
}

/// Finds a candidate already registered under `prefix`, if any.
#[must_use]
pub fn existing_candidate<'a>(children: &'a [String], prefix: &str) -> Option<&'a str> {
    children
        .iter()
        .map(String::as_str)
        .find(|name| name.starts_with(prefix))
}

/// Returns this session's candidate name under `path`, reusing a node
/// left behind by an earlier attempt of the same session before creating
/// a new one.
///
/// The create is issued at most once and never retried here: a second
/// sequential create after an ambiguous failure could leave one session
/// owning two live candidates. On failure the caller restarts the whole
/// attempt, and the reuse scan picks up whatever the failed create did
/// leave behind.
///
/// # Errors
/// Whatever the store reports for the create; the caller decides whether
/// the attempt is retried.
pub fn resolve(
    store: &impl CoordinationStore,
    path: &str,
    children: &[String],
) -> Result<String, StoreError> {
    let prefix = session_prefix(store.session_id());
    if let Some(name) = existing_candidate(children, &prefix) {
        debug!(candidate = name, "reusing candidate from this session");
        return Ok(name.to_string());
    }

    let assigned = store.create_ephemeral_sequential(&format!("{path}/{prefix}"))?;
    let name = assigned
        .rsplit_once('/')
        .map_or(assigned.as_str(), |(_, n)| n)
        .to_string();
    debug!(candidate = %name, "registered new candidate");
    Ok(name)
}
