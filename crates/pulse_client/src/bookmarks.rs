use std::sync::Arc;

use pulse_core::{Article, KeyValueStore};

const BOOKMARKS_KEY: &str = "pulse.bookmarks";

/// Client-owned bookmark set, persisted as a JSON id list under one key.
pub struct Bookmarks {
    kv: Arc<dyn KeyValueStore>,
}

impl Bookmarks {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn load(&self) -> Vec<String> {
        self.kv
            .get(BOOKMARKS_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    fn save(&self, ids: &[String]) {
        if let Ok(raw) = serde_json::to_string(ids) {
            self.kv.set(BOOKMARKS_KEY, &raw);
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.load()
    }

    pub fn contains(&self, article_id: &str) -> bool {
        self.load().iter().any(|id| id == article_id)
    }

    /// Returns whether the article is bookmarked after the toggle.
    pub fn toggle(&self, article_id: &str) -> bool {
        let mut ids = self.load();
        if let Some(pos) = ids.iter().position(|id| id == article_id) {
            ids.remove(pos);
            self.save(&ids);
            false
        } else {
            ids.push(article_id.to_string());
            self.save(&ids);
            true
        }
    }

    pub fn clear(&self) {
        self.kv.remove(BOOKMARKS_KEY);
    }

    /// Keeps only bookmarked articles, preserving batch order.
    pub fn filter(&self, articles: &[Article]) -> Vec<Article> {
        let ids = self.load();
        articles
            .iter()
            .filter(|a| ids.iter().any(|id| id == &a.id))
            .cloned()
            .collect()
    }
}
