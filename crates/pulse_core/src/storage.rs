use async_trait::async_trait;

use crate::error::SubscribeError;
use crate::types::{Article, ModelScore, Regulation, TimelineEvent, Voice};
use crate::Result;

/// What the configured backend supports beyond the baseline contract.
///
/// Probed once when the backend is constructed, never per call; callers
/// pick the simpler query up front instead of paying a failed round-trip.
#[derive(Debug, Clone, Copy)]
pub struct StoreCapabilities {
    /// Ordering by `view_count` is available.
    pub popularity_ordering: bool,
    /// Store-side headline search is available.
    pub headline_search: bool,
}

impl Default for StoreCapabilities {
    fn default() -> Self {
        Self {
            popularity_ordering: true,
            headline_search: true,
        }
    }
}

/// Category filter for paginated browsing. `All` disables the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Category(String),
}

impl CategoryFilter {
    /// "all" (any case) is the sentinel that disables the filter.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Category(raw.to_string())
        }
    }
}

/// Contract the backing relational store has to satisfy.
///
/// Every read returns `Result` and propagates store errors; the degrade
/// policy (empty list / absent entity / silent no-op) lives in the query
/// facade, not here. All recency orderings place articles without a
/// `published_at` last.
#[async_trait]
pub trait ContentStore: Send + Sync {
    fn capabilities(&self) -> StoreCapabilities;

    /// All articles, newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Article>>;

    /// Case-insensitive exact match on `category`, newest first.
    async fn list_by_category(&self, category: &str, limit: usize) -> Result<Vec<Article>>;

    /// Articles whose tag set contains `tag` (exact stored slug), newest first.
    async fn list_by_tag(&self, tag: &str, limit: usize) -> Result<Vec<Article>>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Article>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    async fn list_featured(&self, limit: usize) -> Result<Vec<Article>>;

    async fn list_breaking(&self, limit: usize) -> Result<Vec<Article>>;

    /// Image-bearing articles flagged featured, breaking or exclusive.
    async fn list_hero(&self, limit: usize) -> Result<Vec<Article>>;

    /// Zero-indexed offset pagination. A short page signals end-of-data.
    async fn list_paged(
        &self,
        filter: &CategoryFilter,
        offset: usize,
        page_size: usize,
    ) -> Result<Vec<Article>>;

    /// `view_count` descending, recency as tiebreak.
    async fn list_most_popular(&self, limit: usize) -> Result<Vec<Article>>;

    /// Articles sharing at least one tag with `tags`, excluding `exclude_id`.
    async fn list_tag_overlap(
        &self,
        tags: &[String],
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<Article>>;

    async fn list_category_excluding(
        &self,
        category: &str,
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<Article>>;

    /// Tag arrays of the most recent `window` articles that carry tags.
    async fn recent_tags(&self, window: usize) -> Result<Vec<Vec<String>>>;

    /// Store-side substring search on the headline.
    async fn search_headline(&self, query: &str, limit: usize) -> Result<Vec<Article>>;

    /// Benchmark standings, overall score descending.
    async fn model_scores(&self) -> Result<Vec<ModelScore>>;

    /// Tracked policy items, display order ascending.
    async fn regulations(&self) -> Result<Vec<Regulation>>;

    /// Curated timeline, display order ascending.
    async fn timeline_events(&self) -> Result<Vec<TimelineEvent>>;

    /// Curated pull quotes, display order ascending.
    async fn voices(&self) -> Result<Vec<Voice>>;

    async fn subscriber_count(&self) -> Result<u64>;

    /// Atomic server-side add-1 on the article's view counter.
    async fn increment_view_count(&self, article_id: &str) -> Result<()>;

    /// Atomic server-side add-1 on the model's vote counter.
    async fn increment_vote_count(&self, model_id: i64) -> Result<()>;

    /// Validates and deduplicates server-side.
    async fn subscribe_email(&self, email: &str) -> std::result::Result<(), SubscribeError>;

    // Editorial upserts. Content is curated out-of-band; these back the
    // import tool and tests, not the reading surface.
    async fn upsert_article(&self, article: &Article) -> Result<()>;
    async fn put_model_score(&self, model: &ModelScore) -> Result<()>;
    async fn put_regulation(&self, regulation: &Regulation) -> Result<()>;
    async fn put_timeline_event(&self, event: &TimelineEvent) -> Result<()>;
    async fn put_voice(&self, voice: &Voice) -> Result<()>;
}
