//! Active-branch helpers.

use std::collections::{HashMap, HashSet};

use pivot_types::Entry;

/// Entries on the path from the root to `leaf_id`, root first.
///
/// Returns an empty list when the leaf is unknown. A parent cycle stops the
/// walk at the first repeated id.
pub fn path_to_leaf<'a>(entries: &'a [Entry], leaf_id: &str) -> Vec<&'a Entry> {
    let by_id: HashMap<&str, &Entry> = entries
        .iter()
        .rev()
        .map(|entry| (entry.id.as_str(), entry))
        .collect();

    let mut path = Vec::new();
    let mut seen = HashSet::new();
    let mut current = by_id.get(leaf_id).copied();
    while let Some(entry) = current {
        if !seen.insert(entry.id.as_str()) {
            tracing::warn!(id = %entry.id, "parent cycle while walking to root");
            break;
        }
        path.push(entry);
        current = entry
            .parent_id
            .as_deref()
            .and_then(|pid| by_id.get(pid).copied());
    }
    path.reverse();
    path
}

/// The leaf a freshly loaded log resumes at: the last appended entry.
pub fn default_leaf(entries: &[Entry]) -> Option<&str> {
    entries.last().map(|entry| entry.id.as_str())
}
