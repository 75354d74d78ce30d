use std::cmp::Ordering;
use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use pulse_core::{
    Article, CategoryFilter, ContentStore, Error, ModelScore, Regulation, Result,
    StoreCapabilities, SubscribeError, TimelineEvent, Voice,
};

/// Newest first; articles without a date sort last.
fn by_recency(a: &Article, b: &Article) -> Ordering {
    match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Default)]
struct Inner {
    articles: Vec<Article>,
    models: Vec<ModelScore>,
    regulations: Vec<Regulation>,
    timeline: Vec<TimelineEvent>,
    voices: Vec<Voice>,
    subscribers: BTreeSet<String>,
}

impl Inner {
    fn recent(&self) -> Vec<Article> {
        let mut articles = self.articles.clone();
        articles.sort_by(by_recency);
        articles
    }
}

/// In-memory backend. Always available; backs tests and local development.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    capabilities: StoreCapabilities,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capabilities: StoreCapabilities::default(),
        }
    }

    /// Variant that behaves like a store whose `view_count` column has not
    /// shipped yet: popularity ordering is advertised as unavailable and
    /// the query errors if issued anyway.
    pub fn without_popularity() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capabilities: StoreCapabilities {
                popularity_ordering: false,
                headline_search: true,
            },
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Article>> {
        let inner = self.inner.read().await;
        Ok(inner.recent().into_iter().take(limit).collect())
    }

    async fn list_by_category(&self, category: &str, limit: usize) -> Result<Vec<Article>> {
        let inner = self.inner.read().await;
        Ok(inner
            .recent()
            .into_iter()
            .filter(|a| a.category.eq_ignore_ascii_case(category))
            .take(limit)
            .collect())
    }

    async fn list_by_tag(&self, tag: &str, limit: usize) -> Result<Vec<Article>> {
        let inner = self.inner.read().await;
        Ok(inner
            .recent()
            .into_iter()
            .filter(|a| a.tags.iter().any(|t| t == tag))
            .take(limit)
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Article>> {
        let inner = self.inner.read().await;
        Ok(inner.articles.iter().find(|a| a.id == id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let inner = self.inner.read().await;
        Ok(inner
            .articles
            .iter()
            .find(|a| a.slug.as_deref() == Some(slug))
            .cloned())
    }

    async fn list_featured(&self, limit: usize) -> Result<Vec<Article>> {
        let inner = self.inner.read().await;
        Ok(inner
            .recent()
            .into_iter()
            .filter(|a| a.is_featured)
            .take(limit)
            .collect())
    }

    async fn list_breaking(&self, limit: usize) -> Result<Vec<Article>> {
        let inner = self.inner.read().await;
        Ok(inner
            .recent()
            .into_iter()
            .filter(|a| a.is_breaking)
            .take(limit)
            .collect())
    }

    async fn list_hero(&self, limit: usize) -> Result<Vec<Article>> {
        let inner = self.inner.read().await;
        Ok(inner
            .recent()
            .into_iter()
            .filter(|a| a.is_hero_eligible())
            .take(limit)
            .collect())
    }

    async fn list_paged(
        &self,
        filter: &CategoryFilter,
        offset: usize,
        page_size: usize,
    ) -> Result<Vec<Article>> {
        let inner = self.inner.read().await;
        let articles = inner.recent().into_iter().filter(|a| match filter {
            CategoryFilter::All => true,
            CategoryFilter::Category(category) => a.category.eq_ignore_ascii_case(category),
        });
        Ok(articles.skip(offset).take(page_size).collect())
    }

    async fn list_most_popular(&self, limit: usize) -> Result<Vec<Article>> {
        if !self.capabilities.popularity_ordering {
            return Err(Error::Database(
                "no such column: view_count".to_string(),
            ));
        }
        let inner = self.inner.read().await;
        let mut articles = inner.articles.clone();
        articles.sort_by(|a, b| b.view_count.cmp(&a.view_count).then_with(|| by_recency(a, b)));
        Ok(articles.into_iter().take(limit).collect())
    }

    async fn list_tag_overlap(
        &self,
        tags: &[String],
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<Article>> {
        let inner = self.inner.read().await;
        Ok(inner
            .recent()
            .into_iter()
            .filter(|a| a.id != exclude_id && a.tags.iter().any(|t| tags.contains(t)))
            .take(limit)
            .collect())
    }

    async fn list_category_excluding(
        &self,
        category: &str,
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<Article>> {
        let inner = self.inner.read().await;
        Ok(inner
            .recent()
            .into_iter()
            .filter(|a| a.id != exclude_id && a.category.eq_ignore_ascii_case(category))
            .take(limit)
            .collect())
    }

    async fn recent_tags(&self, window: usize) -> Result<Vec<Vec<String>>> {
        let inner = self.inner.read().await;
        Ok(inner
            .recent()
            .into_iter()
            .filter(|a| !a.tags.is_empty())
            .take(window)
            .map(|a| a.tags)
            .collect())
    }

    async fn search_headline(&self, query: &str, limit: usize) -> Result<Vec<Article>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .recent()
            .into_iter()
            .filter(|a| a.headline.to_lowercase().contains(&needle))
            .take(limit)
            .collect())
    }

    async fn model_scores(&self) -> Result<Vec<ModelScore>> {
        let inner = self.inner.read().await;
        let mut models = inner.models.clone();
        models.sort_by(|a, b| {
            b.score_overall
                .partial_cmp(&a.score_overall)
                .unwrap_or(Ordering::Equal)
        });
        Ok(models)
    }

    async fn regulations(&self) -> Result<Vec<Regulation>> {
        let inner = self.inner.read().await;
        let mut regulations = inner.regulations.clone();
        regulations.sort_by_key(|r| r.sort_order);
        Ok(regulations)
    }

    async fn timeline_events(&self) -> Result<Vec<TimelineEvent>> {
        let inner = self.inner.read().await;
        let mut events = inner.timeline.clone();
        events.sort_by_key(|e| e.sort_order);
        Ok(events)
    }

    async fn voices(&self) -> Result<Vec<Voice>> {
        let inner = self.inner.read().await;
        let mut voices = inner.voices.clone();
        voices.sort_by_key(|v| v.sort_order);
        Ok(voices)
    }

    async fn subscriber_count(&self) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner.subscribers.len() as u64)
    }

    async fn increment_view_count(&self, article_id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(article) = inner.articles.iter_mut().find(|a| a.id == article_id) {
            article.view_count += 1;
        }
        Ok(())
    }

    async fn increment_vote_count(&self, model_id: i64) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(model) = inner.models.iter_mut().find(|m| m.id == model_id) {
            model.vote_count += 1;
        }
        Ok(())
    }

    async fn subscribe_email(&self, email: &str) -> std::result::Result<(), SubscribeError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(SubscribeError::InvalidEmail);
        }
        let mut inner = self.inner.write().await;
        inner.subscribers.insert(email);
        Ok(())
    }

    async fn upsert_article(&self, article: &Article) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.articles.iter_mut().find(|a| a.id == article.id) {
            *existing = article.clone();
        } else {
            inner.articles.push(article.clone());
        }
        Ok(())
    }

    async fn put_model_score(&self, model: &ModelScore) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.models.iter_mut().find(|m| m.id == model.id) {
            *existing = model.clone();
        } else {
            inner.models.push(model.clone());
        }
        Ok(())
    }

    async fn put_regulation(&self, regulation: &Regulation) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.regulations.iter_mut().find(|r| r.id == regulation.id) {
            *existing = regulation.clone();
        } else {
            inner.regulations.push(regulation.clone());
        }
        Ok(())
    }

    async fn put_timeline_event(&self, event: &TimelineEvent) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.timeline.push(event.clone());
        Ok(())
    }

    async fn put_voice(&self, voice: &Voice) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.voices.push(voice.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pulse_core::Trend;

    fn article(id: &str, days_ago: i64) -> Article {
        Article {
            id: id.to_string(),
            headline: format!("Article {}", id),
            category: "models".to_string(),
            published_at: Some(
                Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap() - chrono::Duration::days(days_ago),
            ),
            ..Article::default()
        }
    }

    #[tokio::test]
    async fn recent_orders_newest_first_with_undated_last() {
        let store = MemoryStore::new();
        store.upsert_article(&article("old", 10)).await.unwrap();
        store.upsert_article(&article("new", 1)).await.unwrap();
        store
            .upsert_article(&Article {
                id: "undated".to_string(),
                headline: "No date".to_string(),
                category: "models".to_string(),
                ..Article::default()
            })
            .await
            .unwrap();

        let articles = store.list_recent(10).await.unwrap();
        let ids: Vec<_> = articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
    }

    #[tokio::test]
    async fn popularity_orders_by_view_count_then_recency() {
        let store = MemoryStore::new();
        let mut a = article("a", 5);
        a.view_count = 3;
        let mut b = article("b", 1);
        b.view_count = 10;
        let mut c = article("c", 2);
        c.view_count = 3;
        for art in [&a, &b, &c] {
            store.upsert_article(art).await.unwrap();
        }

        let popular = store.list_most_popular(10).await.unwrap();
        let ids: Vec<_> = popular.iter().map(|a| a.id.as_str()).collect();
        // Tie between a and c broken by recency (c is newer).
        assert_eq!(ids, vec!["b", "c", "a"]);
        for pair in popular.windows(2) {
            assert!(pair[0].view_count >= pair[1].view_count);
        }
    }

    #[tokio::test]
    async fn hero_requires_image_and_flag() {
        let store = MemoryStore::new();
        let mut flagged = article("flagged", 1);
        flagged.image = "https://cdn.example.com/a.jpg".to_string();
        flagged.is_breaking = true;
        let mut imageless = article("imageless", 2);
        imageless.is_featured = true;
        let mut plain = article("plain", 3);
        plain.image = "https://cdn.example.com/b.jpg".to_string();
        for art in [&flagged, &imageless, &plain] {
            store.upsert_article(art).await.unwrap();
        }

        let hero = store.list_hero(10).await.unwrap();
        assert_eq!(hero.len(), 1);
        assert_eq!(hero[0].id, "flagged");
        assert!(hero.iter().all(|a| !a.image.is_empty()));
    }

    #[tokio::test]
    async fn tag_overlap_excludes_and_matches() {
        let store = MemoryStore::new();
        let mut one = article("1", 3);
        one.tags = vec!["llm".to_string()];
        let mut two = article("2", 2);
        two.tags = vec!["llm".to_string(), "gpu".to_string()];
        let mut three = article("3", 1);
        three.tags = vec!["gpu".to_string()];
        for art in [&one, &two, &three] {
            store.upsert_article(art).await.unwrap();
        }

        let related = store
            .list_tag_overlap(&["llm".to_string()], "1", 3)
            .await
            .unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].id, "2");
    }

    #[tokio::test]
    async fn view_count_increments_by_exactly_n() {
        let store = MemoryStore::new();
        let mut x = article("x", 1);
        x.view_count = 5;
        store.upsert_article(&x).await.unwrap();
        store.upsert_article(&article("y", 2)).await.unwrap();

        store.increment_view_count("x").await.unwrap();
        store.increment_view_count("y").await.unwrap();
        store.increment_view_count("x").await.unwrap();

        let x = store.get_by_id("x").await.unwrap().unwrap();
        assert_eq!(x.view_count, 7);
        let y = store.get_by_id("y").await.unwrap().unwrap();
        assert_eq!(y.view_count, 1);
    }

    #[tokio::test]
    async fn paged_short_page_signals_end() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.upsert_article(&article(&format!("a{}", i), i)).await.unwrap();
        }

        let first = store
            .list_paged(&CategoryFilter::All, 0, 3)
            .await
            .unwrap();
        assert_eq!(first.len(), 3);

        let second = store
            .list_paged(&CategoryFilter::All, 3, 3)
            .await
            .unwrap();
        assert_eq!(second.len(), 2);

        let filtered = store
            .list_paged(&CategoryFilter::Category("MODELS".to_string()), 0, 10)
            .await
            .unwrap();
        assert_eq!(filtered.len(), 5);
    }

    #[tokio::test]
    async fn subscribe_validates_and_dedups() {
        let store = MemoryStore::new();
        assert_eq!(
            store.subscribe_email("not-an-email").await,
            Err(SubscribeError::InvalidEmail)
        );
        store.subscribe_email("Reader@Example.com").await.unwrap();
        store.subscribe_email("reader@example.com ").await.unwrap();
        assert_eq!(store.subscriber_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_popularity_column_errors() {
        let store = MemoryStore::without_popularity();
        assert!(!store.capabilities().popularity_ordering);
        assert!(store.list_most_popular(5).await.is_err());
    }

    #[tokio::test]
    async fn vote_count_increments() {
        let store = MemoryStore::new();
        let model = ModelScore {
            id: 7,
            name: "Test".to_string(),
            company: "Lab".to_string(),
            score_overall: 90.0,
            score_coding: 85.0,
            score_reasoning: 88.0,
            score_creative: 80.0,
            context_window: "1M".to_string(),
            highlight: None,
            trend: Trend::Up,
            vote_count: 2,
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        };
        store.put_model_score(&model).await.unwrap();
        store.increment_vote_count(7).await.unwrap();
        let models = store.model_scores().await.unwrap();
        assert_eq!(models[0].vote_count, 3);
    }
}
