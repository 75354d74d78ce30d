use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use pulse_core::{
    Article, CategoryFilter, ContentStore, ModelScore, Regulation, Result, StoreCapabilities,
    SubscribeError, TagCount, TimelineEvent, Voice,
};

pub mod ranking;

pub use ranking::{
    count_for_slug, format_tag_label, matches_category, rank_models, sort_section, SectionSort,
};

/// Recency window scanned when aggregating popular tags. Bounded to keep
/// the aggregation off the full table; counts are approximate once the
/// corpus outgrows the window.
pub const TAG_SCAN_WINDOW: usize = 200;

/// Result cap shared by the store-side and in-memory search paths.
pub const SEARCH_RESULT_CAP: usize = 8;

/// Query facade over the backing store.
///
/// Owns the degrade policy: list reads collapse to an empty batch on store
/// errors, single lookups collapse to absent, counter writes are
/// fire-and-forget. Subscription is the one write that reports back.
#[derive(Clone)]
pub struct ContentFeed {
    store: Arc<dyn ContentStore>,
    capabilities: StoreCapabilities,
}

impl ContentFeed {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        let capabilities = store.capabilities();
        Self {
            store,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    fn list_or_empty(result: Result<Vec<Article>>, op: &str) -> Vec<Article> {
        match result {
            Ok(articles) => articles,
            Err(e) => {
                warn!("{} failed, serving empty list: {}", op, e);
                Vec::new()
            }
        }
    }

    fn item_or_absent(result: Result<Option<Article>>, op: &str) -> Option<Article> {
        match result {
            Ok(article) => article,
            Err(e) => {
                warn!("{} failed, treating as not found: {}", op, e);
                None
            }
        }
    }

    pub async fn recent(&self, limit: usize) -> Vec<Article> {
        Self::list_or_empty(self.store.list_recent(limit).await, "list_recent")
    }

    pub async fn by_category(&self, category: &str, limit: usize) -> Vec<Article> {
        Self::list_or_empty(
            self.store.list_by_category(category, limit).await,
            "list_by_category",
        )
    }

    pub async fn by_tag(&self, tag: &str, limit: usize) -> Vec<Article> {
        Self::list_or_empty(self.store.list_by_tag(tag, limit).await, "list_by_tag")
    }

    pub async fn article(&self, id: &str) -> Option<Article> {
        Self::item_or_absent(self.store.get_by_id(id).await, "get_by_id")
    }

    pub async fn article_by_slug(&self, slug: &str) -> Option<Article> {
        Self::item_or_absent(self.store.get_by_slug(slug).await, "get_by_slug")
    }

    /// Slug first, then id, so old numeric-id links keep resolving after
    /// slugs were introduced.
    pub async fn article_by_slug_or_id(&self, key: &str) -> Option<Article> {
        if let Some(article) = self.article_by_slug(key).await {
            return Some(article);
        }
        self.article(key).await
    }

    pub async fn featured(&self, limit: usize) -> Vec<Article> {
        Self::list_or_empty(self.store.list_featured(limit).await, "list_featured")
    }

    pub async fn breaking(&self, limit: usize) -> Vec<Article> {
        Self::list_or_empty(self.store.list_breaking(limit).await, "list_breaking")
    }

    pub async fn hero(&self, limit: usize) -> Vec<Article> {
        Self::list_or_empty(self.store.list_hero(limit).await, "list_hero")
    }

    /// A page shorter than `page_size` signals end-of-data to the caller.
    pub async fn paged(
        &self,
        filter: &CategoryFilter,
        offset: usize,
        page_size: usize,
    ) -> Vec<Article> {
        Self::list_or_empty(
            self.store.list_paged(filter, offset, page_size).await,
            "list_paged",
        )
    }

    /// Popularity order when the store supports it, recency otherwise.
    /// Callers tolerate either ordering transparently.
    pub async fn most_popular(&self, limit: usize) -> Vec<Article> {
        if !self.capabilities.popularity_ordering {
            return self.recent(limit).await;
        }
        Self::list_or_empty(
            self.store.list_most_popular(limit).await,
            "list_most_popular",
        )
    }

    /// Tag overlap first whenever `tags` is non-empty; same-category
    /// fallback only on empty tags or zero overlap rows.
    pub async fn related(
        &self,
        tags: &[String],
        exclude_id: &str,
        fallback_category: &str,
        limit: usize,
    ) -> Vec<Article> {
        if !tags.is_empty() {
            match self.store.list_tag_overlap(tags, exclude_id, limit).await {
                Ok(overlap) if !overlap.is_empty() => return overlap,
                Ok(_) => {}
                Err(e) => warn!("tag overlap failed, using category fallback: {}", e),
            }
        }
        Self::list_or_empty(
            self.store
                .list_category_excluding(fallback_category, exclude_id, limit)
                .await,
            "related category fallback",
        )
    }

    /// Top tags by occurrence over the bounded recency window, count
    /// descending; ties keep first-seen order.
    pub async fn trending_tags(&self, limit: usize) -> Vec<TagCount> {
        let rows = match self.store.recent_tags(TAG_SCAN_WINDOW).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("recent_tags failed, serving no trending tags: {}", e);
                return Vec::new();
            }
        };
        count_tags(rows, limit)
    }

    pub async fn search_headline(&self, query: &str) -> Vec<Article> {
        if !self.capabilities.headline_search {
            return Vec::new();
        }
        Self::list_or_empty(
            self.store.search_headline(query, SEARCH_RESULT_CAP).await,
            "search_headline",
        )
    }

    pub async fn models(&self) -> Vec<ModelScore> {
        match self.store.model_scores().await {
            Ok(models) => models,
            Err(e) => {
                warn!("model_scores failed, serving empty list: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn regulations(&self) -> Vec<Regulation> {
        match self.store.regulations().await {
            Ok(regulations) => regulations,
            Err(e) => {
                warn!("regulations failed, serving empty list: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn timeline(&self) -> Vec<TimelineEvent> {
        match self.store.timeline_events().await {
            Ok(events) => events,
            Err(e) => {
                warn!("timeline_events failed, serving empty list: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn voices(&self) -> Vec<Voice> {
        match self.store.voices().await {
            Ok(voices) => voices,
            Err(e) => {
                warn!("voices failed, serving empty list: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn subscriber_count(&self) -> u64 {
        self.store.subscriber_count().await.unwrap_or(0)
    }

    /// Fire-and-forget: a missing counter never breaks page rendering.
    pub async fn record_view(&self, article_id: &str) {
        if let Err(e) = self.store.increment_view_count(article_id).await {
            debug!("view count increment dropped: {}", e);
        }
    }

    /// Fire-and-forget, same policy as `record_view`.
    pub async fn cast_vote(&self, model_id: i64) {
        if let Err(e) = self.store.increment_vote_count(model_id).await {
            debug!("vote count increment dropped: {}", e);
        }
    }

    /// Validates locally before any store round-trip.
    pub async fn subscribe(&self, email: &str) -> std::result::Result<(), SubscribeError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(SubscribeError::InvalidEmail);
        }
        self.store.subscribe_email(email).await
    }
}

fn count_tags(rows: Vec<Vec<String>>, limit: usize) -> Vec<TagCount> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u64> = HashMap::new();
    for tags in rows {
        for tag in tags {
            if !counts.contains_key(&tag) {
                order.push(tag.clone());
            }
            *counts.entry(tag).or_insert(0) += 1;
        }
    }
    let mut result: Vec<TagCount> = order
        .into_iter()
        .map(|tag| {
            let count = counts[&tag];
            TagCount { tag, count }
        })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count));
    result.truncate(limit);
    result
}
