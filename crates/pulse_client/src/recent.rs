use std::sync::Arc;

use pulse_core::KeyValueStore;

const RECENT_KEY: &str = "pulse.recent-searches";
const MAX_RECENT: usize = 5;

/// Bounded, deduplicated, most-recent-first list of free-text queries.
pub struct RecentSearches {
    kv: Arc<dyn KeyValueStore>,
}

impl RecentSearches {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn list(&self) -> Vec<String> {
        self.kv
            .get(RECENT_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    pub fn push(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        let mut updated = vec![query.to_string()];
        updated.extend(self.list().into_iter().filter(|q| q != query));
        updated.truncate(MAX_RECENT);
        if let Ok(raw) = serde_json::to_string(&updated) {
            self.kv.set(RECENT_KEY, &raw);
        }
    }
}
