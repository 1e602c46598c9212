//! Whitelist filter over element paths.
//!
//! Lets an operator restrict outbound traffic to the elements a subscriber
//! cares about. Administrative updates and per-event checks may run on
//! different threads, so the state sits behind a lock.

use crate::path::normalize_path;
use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Debug, Default)]
struct FilterState {
    enabled: bool,
    allowed: HashSet<String>,
}

/// Whitelist-based inclusion test over normalized element paths.
///
/// Disabled by default: every path passes until [`FilterPolicy::enable`]
/// is called.
#[derive(Debug, Default)]
pub struct FilterPolicy {
    state: RwLock<FilterState>,
}

impl FilterPolicy {
    /// Create a disabled policy with an empty whitelist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whitelist with the normalized forms of `paths`.
    ///
    /// Does not change whether the whitelist is enabled.
    pub fn set_whitelist<I, S>(&self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed: HashSet<String> = paths
            .into_iter()
            .map(|path| normalize_path(path.as_ref()).to_string())
            .collect();

        tracing::debug!(entries = allowed.len(), "Replacing element whitelist");
        self.state.write().allowed = allowed;
    }

    /// Add one path to the whitelist, keeping existing entries.
    pub fn add_path(&self, path: &str) {
        let path = normalize_path(path);
        tracing::debug!(path, "Observing element");
        self.state.write().allowed.insert(path.to_string());
    }

    /// Start consulting the whitelist.
    pub fn enable(&self) {
        self.state.write().enabled = true;
    }

    /// Stop consulting the whitelist; every path passes.
    pub fn disable(&self) {
        self.state.write().enabled = false;
    }

    /// Whether the whitelist is consulted.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state.read().enabled
    }

    /// Whether events for `path` may be published.
    #[must_use]
    pub fn passes(&self, path: &str) -> bool {
        let state = self.state.read();
        !state.enabled || state.allowed.contains(normalize_path(path))
    }

    /// Snapshot of the whitelist, sorted.
    #[must_use]
    pub fn whitelist(&self) -> Vec<String> {
        let mut entries: Vec<String> = self.state.read().allowed.iter().cloned().collect();
        entries.sort();
        entries
    }
}
