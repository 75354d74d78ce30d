use std::time::{Duration, Instant};

use tokio::sync::OnceCell;

use pulse_core::{Article, TagCount};
use pulse_feed::{ContentFeed, SEARCH_RESULT_CAP};

/// Pause after the last keystroke before a search is issued.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Size of the article batch cached for in-memory matching.
pub const SEARCH_CACHE_SIZE: usize = 100;

/// How many trending tags the overlay shows.
pub const TRENDING_TAG_COUNT: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchPhase {
    Idle,
    Typing,
    Searching,
    Results(Vec<Article>),
    NoResults,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub seq: u64,
    pub query: String,
}

/// Debounced search interaction for one overlay session.
///
/// Pure and clock-driven: the caller feeds keystrokes with `input`, asks
/// `poll` whether the debounce has elapsed, executes the returned request,
/// and reports back through `complete`/`fail`. Sequence numbers enforce
/// last-keystroke-wins: a completion for anything but the newest request
/// is discarded, not merged, so network ordering never matters.
pub struct SearchSession {
    debounce: Duration,
    seq: u64,
    query: String,
    deadline: Option<Instant>,
    in_flight: Option<u64>,
    phase: SearchPhase,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::with_debounce(DEBOUNCE)
    }

    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            debounce,
            seq: 0,
            query: String::new(),
            deadline: None,
            in_flight: None,
            phase: SearchPhase::Idle,
        }
    }

    pub fn phase(&self) -> &SearchPhase {
        &self.phase
    }

    /// Every keystroke restarts the debounce and supersedes anything
    /// already in flight.
    pub fn input(&mut self, query: &str, now: Instant) {
        self.seq += 1;
        self.query = query.trim().to_string();
        if self.query.is_empty() {
            self.deadline = None;
            self.phase = SearchPhase::Idle;
        } else {
            self.deadline = Some(now + self.debounce);
            self.phase = SearchPhase::Typing;
        }
    }

    /// The search to execute, once the debounce interval has passed.
    pub fn poll(&mut self, now: Instant) -> Option<SearchRequest> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        self.in_flight = Some(self.seq);
        self.phase = SearchPhase::Searching;
        Some(SearchRequest {
            seq: self.seq,
            query: self.query.clone(),
        })
    }

    /// Stale completions (older seq) are dropped on the floor.
    pub fn complete(&mut self, seq: u64, results: Vec<Article>) {
        if self.in_flight != Some(seq) || seq != self.seq {
            return;
        }
        self.in_flight = None;
        self.phase = if results.is_empty() {
            SearchPhase::NoResults
        } else {
            SearchPhase::Results(results)
        };
    }

    /// Errors fold into the no-results state.
    pub fn fail(&mut self, seq: u64) {
        self.complete(seq, Vec::new());
    }

    /// Closing the surface clears the pending debounce and any in-flight
    /// interest.
    pub fn close(&mut self) {
        self.query.clear();
        self.deadline = None;
        self.in_flight = None;
        self.phase = SearchPhase::Idle;
    }
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-insensitive, whitespace-tokenized AND-of-substrings match against
/// headline, category and tags. Corpus order is kept; capped at 8.
pub fn fuzzy_match<'a>(query: &str, corpus: &'a [Article]) -> Vec<&'a Article> {
    let tokens: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if tokens.is_empty() {
        return Vec::new();
    }
    corpus
        .iter()
        .filter(|a| {
            let headline = a.headline.to_lowercase();
            let category = a.category.to_lowercase();
            tokens.iter().all(|t| {
                headline.contains(t)
                    || category.contains(t)
                    || a.tags.iter().any(|tag| tag.contains(t.as_str()))
            })
        })
        .take(SEARCH_RESULT_CAP)
        .collect()
}

/// One bounded article batch per session. Filled on the first overlay
/// open, reused afterwards; no TTL, no invalidation. Staleness is the
/// accepted price of snappy repeated opens.
pub struct SearchCache {
    batch: OnceCell<Vec<Article>>,
}

impl SearchCache {
    pub fn new() -> Self {
        Self {
            batch: OnceCell::new(),
        }
    }

    pub async fn articles(&self, feed: &ContentFeed) -> &[Article] {
        self.batch
            .get_or_init(|| async { feed.recent(SEARCH_CACHE_SIZE).await })
            .await
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Session-scoped trending-tag list, fetched once per session.
pub struct TrendingCache {
    tags: OnceCell<Vec<TagCount>>,
}

impl TrendingCache {
    pub fn new() -> Self {
        Self {
            tags: OnceCell::new(),
        }
    }

    pub async fn tags(&self, feed: &ContentFeed) -> &[TagCount] {
        self.tags
            .get_or_init(|| async { feed.trending_tags(TRENDING_TAG_COUNT).await })
            .await
    }
}

impl Default for TrendingCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Store-side headline search first; in-memory fuzzy match over the cached
/// batch when the store yields nothing.
pub async fn run_search(feed: &ContentFeed, cache: &SearchCache, query: &str) -> Vec<Article> {
    let hits = feed.search_headline(query).await;
    if !hits.is_empty() {
        return hits;
    }
    fuzzy_match(query, cache.articles(feed).await)
        .into_iter()
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use pulse_core::ContentStore;
    use pulse_storage::MemoryStore;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn article(id: &str, headline: &str, category: &str, tags: &[&str]) -> Article {
        Article {
            id: id.to_string(),
            headline: headline.to_string(),
            category: category.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Article::default()
        }
    }

    #[test]
    fn debounce_keeps_only_the_last_keystroke() {
        let t0 = Instant::now();
        let mut session = SearchSession::with_debounce(ms(300));

        session.input("a", t0);
        session.input("ab", t0 + ms(100));
        // The "a" deadline was superseded; nothing fires at 350ms.
        assert!(session.poll(t0 + ms(350)).is_none());

        session.input("abc", t0 + ms(400));
        assert!(session.poll(t0 + ms(600)).is_none());

        let request = session.poll(t0 + ms(700)).unwrap();
        assert_eq!(request.query, "abc");
        // Exactly one completed search: the timer is spent.
        assert!(session.poll(t0 + ms(800)).is_none());

        session.complete(request.seq, vec![Article::default()]);
        assert!(matches!(session.phase(), SearchPhase::Results(r) if r.len() == 1));
    }

    #[test]
    fn stale_completion_is_discarded() {
        let t0 = Instant::now();
        let mut session = SearchSession::with_debounce(ms(300));

        session.input("a", t0);
        let stale = session.poll(t0 + ms(300)).unwrap();

        // A newer keystroke supersedes the in-flight search.
        session.input("ab", t0 + ms(350));
        session.complete(stale.seq, vec![Article::default()]);
        assert_eq!(session.phase(), &SearchPhase::Typing);

        let fresh = session.poll(t0 + ms(650)).unwrap();
        session.complete(fresh.seq, Vec::new());
        assert_eq!(session.phase(), &SearchPhase::NoResults);
    }

    #[test]
    fn errors_fold_into_no_results() {
        let t0 = Instant::now();
        let mut session = SearchSession::with_debounce(ms(300));
        session.input("gpt", t0);
        let request = session.poll(t0 + ms(300)).unwrap();
        session.fail(request.seq);
        assert_eq!(session.phase(), &SearchPhase::NoResults);
    }

    #[test]
    fn close_clears_the_pending_timer() {
        let t0 = Instant::now();
        let mut session = SearchSession::with_debounce(ms(300));
        session.input("gpt", t0);
        session.close();
        assert!(session.poll(t0 + ms(1000)).is_none());
        assert_eq!(session.phase(), &SearchPhase::Idle);
    }

    #[test]
    fn clearing_the_query_returns_to_idle() {
        let t0 = Instant::now();
        let mut session = SearchSession::with_debounce(ms(300));
        session.input("gpt", t0);
        session.input("", t0 + ms(50));
        assert_eq!(session.phase(), &SearchPhase::Idle);
        assert!(session.poll(t0 + ms(1000)).is_none());
    }

    #[test]
    fn fuzzy_requires_every_token() {
        let corpus = vec![
            article("1", "GPT-5 benchmark results", "Models", &["gpt", "benchmarks"]),
            article("2", "Agent swarm deployments", "Agents", &["agent-swarm"]),
            article("3", "GPT agents in production", "Agents", &["gpt"]),
        ];

        let hits = fuzzy_match("gpt agent", &corpus);
        let ids: Vec<_> = hits.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["3"]);

        // Single token matches across headline, category and tags.
        assert_eq!(fuzzy_match("SWARM", &corpus).len(), 1);
        assert!(fuzzy_match("", &corpus).is_empty());
    }

    #[test]
    fn fuzzy_caps_at_eight_in_corpus_order() {
        let corpus: Vec<Article> = (0..12)
            .map(|i| article(&format!("a{}", i), "LLM news", "Models", &[]))
            .collect();
        let hits = fuzzy_match("llm", &corpus);
        assert_eq!(hits.len(), 8);
        assert_eq!(hits[0].id, "a0");
    }

    #[tokio::test]
    async fn cache_serves_the_first_snapshot_for_the_session() {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_article(&article("first", "First", "Models", &[]))
            .await
            .unwrap();
        let feed = ContentFeed::new(store.clone());
        let cache = SearchCache::new();

        assert_eq!(cache.articles(&feed).await.len(), 1);

        // New content lands after the first open; the session cache does
        // not re-fetch.
        store
            .upsert_article(&article("second", "Second", "Models", &[]))
            .await
            .unwrap();
        assert_eq!(cache.articles(&feed).await.len(), 1);
    }

    #[tokio::test]
    async fn run_search_falls_back_to_fuzzy_over_the_cache() {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_article(&article("tagged", "Weekly roundup", "Models", &["agent-swarm"]))
            .await
            .unwrap();
        let feed = ContentFeed::new(store);
        let cache = SearchCache::new();

        // "swarm" misses the headline, so the store-side path yields
        // nothing and the tag match over the cache answers.
        let results = run_search(&feed, &cache, "swarm").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "tagged");

        let direct = run_search(&feed, &cache, "roundup").await;
        assert_eq!(direct.len(), 1);
    }
}
