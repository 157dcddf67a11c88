//! Identity cache: VK user id -> inbox contact id (source_id).
//!
//! Process-local memoization of contact resolution. Entries are never evicted; the
//! inbox stays the source of truth, so a missing entry only costs a remote call.

use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory store of resolved contacts, shared by concurrent resolutions.
pub struct IdentityCache {
    entries: RwLock<HashMap<i64, String>>,
    max_entries: usize,
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::with_max_entries(usize::MAX)
    }

    /// Cache that stops accepting new users once it holds `max_entries`.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    pub async fn get(&self, user_id: i64) -> Option<String> {
        self.entries.read().await.get(&user_id).cloned()
    }

    /// Record a resolved contact. Existing entries are kept (first write wins);
    /// returns false when the entry was not stored.
    pub async fn insert(&self, user_id: i64, contact_id: impl Into<String>) -> bool {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&user_id) {
            return false;
        }
        if entries.len() >= self.max_entries {
            log::debug!("identity cache full ({} entries), not caching vk user {}", entries.len(), user_id);
            return false;
        }
        entries.insert(user_id, contact_id.into());
        true
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
