use crate::error::LockError;

/// Width of the sequence counter the store appends to sequential nodes.
pub const SEQUENCE_WIDTH: usize = 10;

/// Extracts the sequence suffix of a candidate name: the digits after
/// the last `-`.
///
/// Fails closed on anything that does not match the fixed-width contract
/// so a stray node cannot silently mis-order the candidate set.
///
/// # Errors
/// [`LockError::MalformedCandidate`] when there is no `-` separator or
/// the suffix is not exactly [`SEQUENCE_WIDTH`] ASCII digits.
pub fn sequence_suffix(name: &str) -> Result<&str, LockError> {
    let malformed = || LockError::MalformedCandidate {
        name: name.to_string(),
    };
    let (_, suffix) = name.rsplit_once('-').ok_or_else(malformed)?;
    if suffix.len() != SEQUENCE_WIDTH || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    Ok(suffix)
}

/// Sorts candidate names ascending by sequence suffix.
///
/// Fixed-width zero padding makes lexicographic comparison of the suffix
/// coincide with numeric order, so no parsing into integers is needed.
pub fn sort_by_sequence(names: Vec<String>) -> Result<Vec<String>, LockError> {
    let mut keyed = Vec::with_capacity(names.len());
    for name in names {
        let key = sequence_suffix(&name)?.to_string();
        keyed.push((key, name));
    }
    keyed.sort();
    Ok(keyed.into_iter().map(|(_, name)| name).collect())
}

/// Returns the last element of `sorted` strictly below `target`, or
/// `None` when the target is the minimum.
///
/// With ascending input this is the maximal element below the target,
/// i.e. the immediate predecessor. The full scan is deliberate;
/// candidate sets stay small.
///
/// # Errors
/// [`LockError::MalformedCandidate`] if any name violates the suffix
/// contract.
pub fn floor<'a>(sorted: &'a [String], target: &str) -> Result<Option<&'a str>, LockError> {
    let target_key = sequence_suffix(target)?;
    let mut below = None;
    for name in sorted {
        if sequence_suffix(name)? < target_key {
            below = Some(name.as_str());
        }
    }
    Ok(below)
}
