//! In-memory existence index for containers.

use std::collections::{HashMap, HashSet};

/// Records which (account, container) pairs exist.
///
/// Containers are grouped per account so lookups borrow the caller's names
/// instead of building an owned key.
///
/// The index holds no lock of its own. The engine keeps it behind a single
/// `RwLock` and mutates it inside the same write section as the matching
/// directory create/remove, so the two never disagree.
#[derive(Debug, Default)]
pub struct NamespaceIndex {
    accounts: HashMap<String, HashSet<String>>,
}

impl NamespaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the container is recorded.
    pub fn exists(&self, account: &str, container: &str) -> bool {
        self.accounts
            .get(account)
            .is_some_and(|containers| containers.contains(container))
    }

    /// Records the container. Returns `false` if it was already present.
    pub fn mark(&mut self, account: &str, container: &str) -> bool {
        if self.exists(account, container) {
            return false;
        }
        self.accounts
            .entry(account.to_string())
            .or_default()
            .insert(container.to_string())
    }

    /// Forgets the container. Returns `false` if it was not present.
    pub fn unmark(&mut self, account: &str, container: &str) -> bool {
        let Some(containers) = self.accounts.get_mut(account) else {
            return false;
        };
        let removed = containers.remove(container);
        if containers.is_empty() {
            self.accounts.remove(account);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.accounts.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
