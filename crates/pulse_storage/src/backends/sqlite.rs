use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use pulse_core::{
    Article, ArticleSource, CategoryFilter, ContentStore, Error, Impact, ModelScore, Regulation,
    RegulationStatus, Result, StoreCapabilities, SubscribeError, TimelineEvent, TimelineKind,
    Trend, Voice,
};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        slug TEXT UNIQUE,
        headline TEXT NOT NULL,
        excerpt TEXT,
        summary TEXT,
        body TEXT,
        image TEXT,
        category TEXT NOT NULL,
        author TEXT,
        read_time TEXT,
        published_at TEXT,
        original_url TEXT,
        is_exclusive INTEGER NOT NULL DEFAULT 0,
        is_featured INTEGER NOT NULL DEFAULT 0,
        is_breaking INTEGER NOT NULL DEFAULT 0,
        source_name TEXT,
        source_url TEXT,
        source_favicon TEXT,
        tags TEXT,
        key_points TEXT,
        why_it_matters TEXT,
        view_count INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS model_scores (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        company TEXT NOT NULL,
        score_overall REAL NOT NULL,
        score_coding REAL NOT NULL,
        score_reasoning REAL NOT NULL,
        score_creative REAL NOT NULL,
        context_window TEXT NOT NULL,
        highlight TEXT,
        trend TEXT NOT NULL,
        vote_count INTEGER NOT NULL DEFAULT 0,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS regulations (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        region TEXT NOT NULL,
        status TEXT NOT NULL,
        impact TEXT NOT NULL,
        deadline TEXT,
        description TEXT NOT NULL,
        source_url TEXT NOT NULL,
        sort_order INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS timeline_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        year TEXT NOT NULL,
        quarter TEXT,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        kind TEXT NOT NULL,
        sort_order INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS voices (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        title TEXT NOT NULL,
        company TEXT NOT NULL,
        avatar TEXT NOT NULL,
        quote TEXT NOT NULL,
        article_link TEXT,
        sort_order INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS subscribers (
        email TEXT PRIMARY KEY,
        created_at TEXT NOT NULL
    )
    "#,
    // Add future migrations here
];

fn db_err(e: sqlx::Error) -> Error {
    Error::Database(e.to_string())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

/// Maps one raw row to one domain article.
///
/// Optional columns coalesce to defaults and never fail the mapping;
/// missing required columns (`id`, `headline`, `category`) propagate.
fn article_from_row(row: &SqliteRow) -> Result<Article> {
    let id: String = row.try_get("id").map_err(db_err)?;
    let headline: String = row.try_get("headline").map_err(db_err)?;
    let category: String = row.try_get("category").map_err(db_err)?;

    let opt = |name: &str| -> Option<String> { row.try_get(name).unwrap_or(None) };

    let source = opt("source_name").map(|name| ArticleSource {
        name,
        url: opt("source_url").unwrap_or_default(),
        favicon: opt("source_favicon"),
    });

    let tags: Vec<String> = match opt("tags") {
        Some(raw) => serde_json::from_str(&raw)?,
        None => Vec::new(),
    };
    let key_points: Vec<String> = match opt("key_points") {
        Some(raw) => serde_json::from_str(&raw)?,
        None => Vec::new(),
    };

    Ok(Article {
        id,
        slug: opt("slug"),
        headline,
        excerpt: opt("excerpt"),
        summary: opt("summary"),
        body: opt("body"),
        image: opt("image").unwrap_or_default(),
        category,
        author: opt("author"),
        read_time: opt("read_time").unwrap_or_else(|| Article::DEFAULT_READ_TIME.to_string()),
        published_at: opt("published_at").and_then(|raw| parse_timestamp(&raw)),
        original_url: opt("original_url"),
        is_exclusive: row.try_get("is_exclusive").unwrap_or(false),
        is_featured: row.try_get("is_featured").unwrap_or(false),
        is_breaking: row.try_get("is_breaking").unwrap_or(false),
        source,
        tags,
        key_points,
        why_it_matters: opt("why_it_matters"),
        view_count: row.try_get("view_count").unwrap_or(0),
    })
}

fn articles_from_rows(rows: &[SqliteRow]) -> Result<Vec<Article>> {
    rows.iter().map(article_from_row).collect()
}

fn trend_from_str(raw: &str) -> Trend {
    match raw {
        "up" => Trend::Up,
        "down" => Trend::Down,
        _ => Trend::Same,
    }
}

fn trend_str(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "up",
        Trend::Down => "down",
        Trend::Same => "same",
    }
}

fn model_from_row(row: &SqliteRow) -> Result<ModelScore> {
    let trend: String = row.try_get("trend").map_err(db_err)?;
    let updated_at: String = row.try_get("updated_at").map_err(db_err)?;
    Ok(ModelScore {
        id: row.try_get("id").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        company: row.try_get("company").map_err(db_err)?,
        score_overall: row.try_get("score_overall").map_err(db_err)?,
        score_coding: row.try_get("score_coding").map_err(db_err)?,
        score_reasoning: row.try_get("score_reasoning").map_err(db_err)?,
        score_creative: row.try_get("score_creative").map_err(db_err)?,
        context_window: row.try_get("context_window").map_err(db_err)?,
        highlight: row.try_get("highlight").unwrap_or(None),
        trend: trend_from_str(&trend),
        vote_count: row.try_get("vote_count").unwrap_or(0),
        updated_at: parse_timestamp(&updated_at)
            .ok_or_else(|| Error::Database(format!("bad timestamp: {}", updated_at)))?,
    })
}

fn regulation_from_row(row: &SqliteRow) -> Result<Regulation> {
    let status: String = row.try_get("status").map_err(db_err)?;
    let impact: String = row.try_get("impact").map_err(db_err)?;
    let deadline: Option<String> = row.try_get("deadline").unwrap_or(None);
    Ok(Regulation {
        id: row.try_get("id").map_err(db_err)?,
        title: row.try_get("title").map_err(db_err)?,
        region: row.try_get("region").map_err(db_err)?,
        status: match status.as_str() {
            "enacted" => RegulationStatus::Enacted,
            "pending" => RegulationStatus::Pending,
            _ => RegulationStatus::Proposed,
        },
        impact: match impact.as_str() {
            "high" => Impact::High,
            "medium" => Impact::Medium,
            _ => Impact::Low,
        },
        deadline: deadline.and_then(|raw| NaiveDate::parse_from_str(&raw, "%Y-%m-%d").ok()),
        description: row.try_get("description").map_err(db_err)?,
        source_url: row.try_get("source_url").map_err(db_err)?,
        sort_order: row.try_get("sort_order").map_err(db_err)?,
    })
}

fn timeline_from_row(row: &SqliteRow) -> Result<TimelineEvent> {
    let kind: String = row.try_get("kind").map_err(db_err)?;
    Ok(TimelineEvent {
        year: row.try_get("year").map_err(db_err)?,
        quarter: row.try_get("quarter").unwrap_or(None),
        title: row.try_get("title").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        kind: match kind.as_str() {
            "past" => TimelineKind::Past,
            "present" => TimelineKind::Present,
            _ => TimelineKind::Future,
        },
        sort_order: row.try_get("sort_order").map_err(db_err)?,
    })
}

fn voice_from_row(row: &SqliteRow) -> Result<Voice> {
    Ok(Voice {
        name: row.try_get("name").map_err(db_err)?,
        title: row.try_get("title").map_err(db_err)?,
        company: row.try_get("company").map_err(db_err)?,
        avatar: row.try_get("avatar").map_err(db_err)?,
        quote: row.try_get("quote").map_err(db_err)?,
        article_link: row.try_get("article_link").unwrap_or(None),
        sort_order: row.try_get("sort_order").map_err(db_err)?,
    })
}

pub struct SqliteStore {
    pool: SqlitePool,
    capabilities: StoreCapabilities,
}

impl SqliteStore {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await.map_err(db_err)?;
        Self::with_pool(pool).await
    }

    pub async fn in_memory() -> Result<Self> {
        // A pooled ":memory:" database is per-connection; pin one connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db_err)?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("migration {} failed: {}", i, e)))?;
        }

        // Capability negotiation: probe the optional column once here
        // instead of catching a failed query on every popularity read.
        let popularity_ordering = sqlx::query("SELECT view_count FROM articles LIMIT 0")
            .execute(&pool)
            .await
            .is_ok();

        Ok(Self {
            pool,
            capabilities: StoreCapabilities {
                popularity_ordering,
                headline_search: true,
            },
        })
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            "SELECT * FROM articles ORDER BY published_at DESC NULLS LAST LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        articles_from_rows(&rows)
    }

    async fn list_by_category(&self, category: &str, limit: usize) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            "SELECT * FROM articles WHERE LOWER(category) = LOWER(?) \
             ORDER BY published_at DESC NULLS LAST LIMIT ?",
        )
        .bind(category)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        articles_from_rows(&rows)
    }

    async fn list_by_tag(&self, tag: &str, limit: usize) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            "SELECT * FROM articles WHERE tags IS NOT NULL \
             AND EXISTS (SELECT 1 FROM json_each(articles.tags) WHERE json_each.value = ?) \
             ORDER BY published_at DESC NULLS LAST LIMIT ?",
        )
        .bind(tag)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        articles_from_rows(&rows)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(article_from_row).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(article_from_row).transpose()
    }

    async fn list_featured(&self, limit: usize) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            "SELECT * FROM articles WHERE is_featured = 1 \
             ORDER BY published_at DESC NULLS LAST LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        articles_from_rows(&rows)
    }

    async fn list_breaking(&self, limit: usize) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            "SELECT * FROM articles WHERE is_breaking = 1 \
             ORDER BY published_at DESC NULLS LAST LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        articles_from_rows(&rows)
    }

    async fn list_hero(&self, limit: usize) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            "SELECT * FROM articles \
             WHERE image IS NOT NULL AND image != '' \
             AND (is_featured = 1 OR is_breaking = 1 OR is_exclusive = 1) \
             ORDER BY published_at DESC NULLS LAST LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        articles_from_rows(&rows)
    }

    async fn list_paged(
        &self,
        filter: &CategoryFilter,
        offset: usize,
        page_size: usize,
    ) -> Result<Vec<Article>> {
        let rows = match filter {
            CategoryFilter::All => {
                sqlx::query(
                    "SELECT * FROM articles ORDER BY published_at DESC NULLS LAST \
                     LIMIT ? OFFSET ?",
                )
                .bind(page_size as i64)
                .bind(offset as i64)
                .fetch_all(&self.pool)
                .await
            }
            CategoryFilter::Category(category) => {
                sqlx::query(
                    "SELECT * FROM articles WHERE LOWER(category) = LOWER(?) \
                     ORDER BY published_at DESC NULLS LAST LIMIT ? OFFSET ?",
                )
                .bind(category)
                .bind(page_size as i64)
                .bind(offset as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_err)?;
        articles_from_rows(&rows)
    }

    async fn list_most_popular(&self, limit: usize) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            "SELECT * FROM articles \
             ORDER BY view_count DESC, published_at DESC NULLS LAST LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        articles_from_rows(&rows)
    }

    async fn list_tag_overlap(
        &self,
        tags: &[String],
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<Article>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; tags.len()].join(", ");
        let sql = format!(
            "SELECT * FROM articles \
             WHERE id != ? AND tags IS NOT NULL \
             AND EXISTS (SELECT 1 FROM json_each(articles.tags) WHERE json_each.value IN ({})) \
             ORDER BY published_at DESC NULLS LAST LIMIT ?",
            placeholders
        );
        let mut query = sqlx::query(&sql).bind(exclude_id);
        for tag in tags {
            query = query.bind(tag);
        }
        let rows = query
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        articles_from_rows(&rows)
    }

    async fn list_category_excluding(
        &self,
        category: &str,
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            "SELECT * FROM articles WHERE LOWER(category) = LOWER(?) AND id != ? \
             ORDER BY published_at DESC NULLS LAST LIMIT ?",
        )
        .bind(category)
        .bind(exclude_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        articles_from_rows(&rows)
    }

    async fn recent_tags(&self, window: usize) -> Result<Vec<Vec<String>>> {
        let rows = sqlx::query(
            "SELECT tags FROM articles WHERE tags IS NOT NULL \
             ORDER BY published_at DESC NULLS LAST LIMIT ?",
        )
        .bind(window as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut all = Vec::with_capacity(rows.len());
        for row in &rows {
            let raw: String = row.try_get("tags").map_err(db_err)?;
            all.push(serde_json::from_str(&raw)?);
        }
        Ok(all)
    }

    async fn search_headline(&self, query: &str, limit: usize) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            "SELECT * FROM articles WHERE headline LIKE '%' || ? || '%' \
             ORDER BY published_at DESC NULLS LAST LIMIT ?",
        )
        .bind(query)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        articles_from_rows(&rows)
    }

    async fn model_scores(&self) -> Result<Vec<ModelScore>> {
        let rows = sqlx::query("SELECT * FROM model_scores ORDER BY score_overall DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(model_from_row).collect()
    }

    async fn regulations(&self) -> Result<Vec<Regulation>> {
        let rows = sqlx::query("SELECT * FROM regulations ORDER BY sort_order ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(regulation_from_row).collect()
    }

    async fn timeline_events(&self) -> Result<Vec<TimelineEvent>> {
        let rows = sqlx::query("SELECT * FROM timeline_events ORDER BY sort_order ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(timeline_from_row).collect()
    }

    async fn voices(&self) -> Result<Vec<Voice>> {
        let rows = sqlx::query("SELECT * FROM voices ORDER BY sort_order ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(voice_from_row).collect()
    }

    async fn subscriber_count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM subscribers")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        let n: i64 = row.try_get("n").map_err(db_err)?;
        Ok(n as u64)
    }

    async fn increment_view_count(&self, article_id: &str) -> Result<()> {
        sqlx::query("UPDATE articles SET view_count = view_count + 1 WHERE id = ?")
            .bind(article_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn increment_vote_count(&self, model_id: i64) -> Result<()> {
        sqlx::query("UPDATE model_scores SET vote_count = vote_count + 1 WHERE id = ?")
            .bind(model_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn subscribe_email(&self, email: &str) -> std::result::Result<(), SubscribeError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(SubscribeError::InvalidEmail);
        }
        sqlx::query(
            "INSERT INTO subscribers (email, created_at) VALUES (?, ?) \
             ON CONFLICT(email) DO NOTHING",
        )
        .bind(&email)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| SubscribeError::Failed(e.to_string()))?;
        Ok(())
    }

    async fn upsert_article(&self, article: &Article) -> Result<()> {
        let tags = if article.tags.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&article.tags)?)
        };
        let key_points = if article.key_points.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&article.key_points)?)
        };

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO articles
            (id, slug, headline, excerpt, summary, body, image, category, author,
             read_time, published_at, original_url, is_exclusive, is_featured,
             is_breaking, source_name, source_url, source_favicon, tags, key_points,
             why_it_matters, view_count)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.id)
        .bind(&article.slug)
        .bind(&article.headline)
        .bind(&article.excerpt)
        .bind(&article.summary)
        .bind(&article.body)
        .bind(&article.image)
        .bind(&article.category)
        .bind(&article.author)
        .bind(&article.read_time)
        .bind(article.published_at.map(|at| at.to_rfc3339()))
        .bind(&article.original_url)
        .bind(article.is_exclusive)
        .bind(article.is_featured)
        .bind(article.is_breaking)
        .bind(article.source.as_ref().map(|s| s.name.clone()))
        .bind(article.source.as_ref().map(|s| s.url.clone()))
        .bind(article.source.as_ref().and_then(|s| s.favicon.clone()))
        .bind(tags)
        .bind(key_points)
        .bind(&article.why_it_matters)
        .bind(article.view_count)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn put_model_score(&self, model: &ModelScore) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO model_scores
            (id, name, company, score_overall, score_coding, score_reasoning,
             score_creative, context_window, highlight, trend, vote_count, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(model.id)
        .bind(&model.name)
        .bind(&model.company)
        .bind(model.score_overall)
        .bind(model.score_coding)
        .bind(model.score_reasoning)
        .bind(model.score_creative)
        .bind(&model.context_window)
        .bind(&model.highlight)
        .bind(trend_str(model.trend))
        .bind(model.vote_count)
        .bind(model.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn put_regulation(&self, regulation: &Regulation) -> Result<()> {
        let status = match regulation.status {
            RegulationStatus::Enacted => "enacted",
            RegulationStatus::Pending => "pending",
            RegulationStatus::Proposed => "proposed",
        };
        let impact = match regulation.impact {
            Impact::High => "high",
            Impact::Medium => "medium",
            Impact::Low => "low",
        };
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO regulations
            (id, title, region, status, impact, deadline, description, source_url, sort_order)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&regulation.id)
        .bind(&regulation.title)
        .bind(&regulation.region)
        .bind(status)
        .bind(impact)
        .bind(regulation.deadline.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(&regulation.description)
        .bind(&regulation.source_url)
        .bind(regulation.sort_order)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn put_timeline_event(&self, event: &TimelineEvent) -> Result<()> {
        let kind = match event.kind {
            TimelineKind::Past => "past",
            TimelineKind::Present => "present",
            TimelineKind::Future => "future",
        };
        sqlx::query(
            "INSERT INTO timeline_events (year, quarter, title, description, kind, sort_order) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.year)
        .bind(&event.quarter)
        .bind(&event.title)
        .bind(&event.description)
        .bind(kind)
        .bind(event.sort_order)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn put_voice(&self, voice: &Voice) -> Result<()> {
        sqlx::query(
            "INSERT INTO voices (name, title, company, avatar, quote, article_link, sort_order) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&voice.name)
        .bind(&voice.title)
        .bind(&voice.company)
        .bind(&voice.avatar)
        .bind(&voice.quote)
        .bind(&voice.article_link)
        .bind(voice.sort_order)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn article(id: &str, days_ago: i64) -> Article {
        Article {
            id: id.to_string(),
            headline: format!("Headline {}", id),
            category: "models".to_string(),
            published_at: Some(
                Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap() - chrono::Duration::days(days_ago),
            ),
            ..Article::default()
        }
    }

    #[tokio::test]
    async fn roundtrip_preserves_all_fields() {
        let store = SqliteStore::in_memory().await.unwrap();
        let full = Article {
            id: "a1".to_string(),
            slug: Some("gpt-5-launch".to_string()),
            headline: "GPT-5 launches".to_string(),
            excerpt: Some("Short".to_string()),
            summary: Some("Summary".to_string()),
            body: Some("Body text".to_string()),
            image: "https://cdn.example.com/a.jpg".to_string(),
            category: "Models".to_string(),
            author: Some("Jane Doe".to_string()),
            read_time: "5 min read".to_string(),
            published_at: Some(Utc.with_ymd_and_hms(2026, 8, 1, 9, 30, 0).unwrap()),
            original_url: Some("https://example.com/src".to_string()),
            is_exclusive: true,
            is_featured: true,
            is_breaking: false,
            source: Some(ArticleSource {
                name: "Example Wire".to_string(),
                url: "https://example.com".to_string(),
                favicon: Some("https://example.com/favicon.ico".to_string()),
            }),
            tags: vec!["gpt".to_string(), "llm".to_string()],
            key_points: vec!["Point one".to_string()],
            why_it_matters: Some("Because".to_string()),
            view_count: 12,
        };

        store.upsert_article(&full).await.unwrap();
        let loaded = store.get_by_id("a1").await.unwrap().unwrap();
        assert_eq!(loaded, full);

        let by_slug = store.get_by_slug("gpt-5-launch").await.unwrap().unwrap();
        assert_eq!(by_slug.id, "a1");
    }

    #[tokio::test]
    async fn mapping_coalesces_missing_optionals() {
        let store = SqliteStore::in_memory().await.unwrap();
        sqlx::query("INSERT INTO articles (id, headline, category) VALUES ('bare', 'Bare', 'news')")
            .execute(&store.pool)
            .await
            .unwrap();

        let bare = store.get_by_id("bare").await.unwrap().unwrap();
        assert_eq!(bare.read_time, Article::DEFAULT_READ_TIME);
        assert_eq!(bare.image, "");
        assert!(bare.tags.is_empty());
        assert!(bare.published_at.is_none());
        assert!(bare.source.is_none());
        assert_eq!(bare.view_count, 0);
    }

    #[tokio::test]
    async fn tag_queries_match_exact_slugs() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut one = article("1", 3);
        one.tags = vec!["llm".to_string()];
        let mut two = article("2", 2);
        two.tags = vec!["llm".to_string(), "gpu".to_string()];
        let mut three = article("3", 1);
        three.tags = vec!["gpu".to_string()];
        for art in [&one, &two, &three] {
            store.upsert_article(art).await.unwrap();
        }

        let llm = store.list_by_tag("llm", 10).await.unwrap();
        let ids: Vec<_> = llm.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);

        // No partial matches on the stored slug.
        assert!(store.list_by_tag("ll", 10).await.unwrap().is_empty());

        let related = store
            .list_tag_overlap(&["llm".to_string()], "1", 3)
            .await
            .unwrap();
        let ids: Vec<_> = related.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[tokio::test]
    async fn popularity_orders_with_recency_tiebreak() {
        let store = SqliteStore::in_memory().await.unwrap();
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
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn increments_are_atomic_adds() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut x = article("x", 1);
        x.view_count = 5;
        store.upsert_article(&x).await.unwrap();

        store.increment_view_count("x").await.unwrap();
        store.increment_view_count("x").await.unwrap();

        let x = store.get_by_id("x").await.unwrap().unwrap();
        assert_eq!(x.view_count, 7);
    }

    #[tokio::test]
    async fn hero_filters_imageless_and_unflagged() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut flagged = article("flagged", 1);
        flagged.image = "https://cdn.example.com/a.jpg".to_string();
        flagged.is_exclusive = true;
        let mut imageless = article("imageless", 2);
        imageless.is_featured = true;
        for art in [&flagged, &imageless] {
            store.upsert_article(art).await.unwrap();
        }

        let hero = store.list_hero(10).await.unwrap();
        assert_eq!(hero.len(), 1);
        assert!(hero[0].is_hero_eligible());
    }

    #[tokio::test]
    async fn paged_respects_offset_and_filter() {
        let store = SqliteStore::in_memory().await.unwrap();
        for i in 0..5 {
            let mut art = article(&format!("a{}", i), i);
            if i >= 3 {
                art.category = "agents".to_string();
            }
            store.upsert_article(&art).await.unwrap();
        }

        let page = store
            .list_paged(&CategoryFilter::Category("models".to_string()), 1, 2)
            .await
            .unwrap();
        let ids: Vec<_> = page.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2"]);

        let tail = store.list_paged(&CategoryFilter::All, 4, 3).await.unwrap();
        assert_eq!(tail.len(), 1);
    }

    #[tokio::test]
    async fn headline_search_is_case_insensitive_substring() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut hit = article("hit", 1);
        hit.headline = "Anthropic ships new model".to_string();
        let mut miss = article("miss", 2);
        miss.headline = "Quarterly funding roundup".to_string();
        for art in [&hit, &miss] {
            store.upsert_article(art).await.unwrap();
        }

        let results = store.search_headline("SHIPS", 8).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "hit");
    }

    #[tokio::test]
    async fn subscribe_validates_and_dedups() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert_eq!(
            store.subscribe_email("nope").await,
            Err(SubscribeError::InvalidEmail)
        );
        store.subscribe_email("Reader@Example.com").await.unwrap();
        store.subscribe_email(" reader@example.com").await.unwrap();
        assert_eq!(store.subscriber_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn secondary_entities_roundtrip_in_display_order() {
        let store = SqliteStore::in_memory().await.unwrap();

        let model = ModelScore {
            id: 1,
            name: "Best".to_string(),
            company: "Lab".to_string(),
            score_overall: 95.0,
            score_coding: 90.0,
            score_reasoning: 92.0,
            score_creative: 88.0,
            context_window: "1M".to_string(),
            highlight: Some("New".to_string()),
            trend: Trend::Up,
            vote_count: 0,
            updated_at: Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap(),
        };
        let mut runner_up = model.clone();
        runner_up.id = 2;
        runner_up.name = "Second".to_string();
        runner_up.score_overall = 91.0;
        runner_up.trend = Trend::Down;
        store.put_model_score(&runner_up).await.unwrap();
        store.put_model_score(&model).await.unwrap();

        let models = store.model_scores().await.unwrap();
        assert_eq!(models[0].name, "Best");
        assert_eq!(models[0].trend, Trend::Up);

        store.increment_vote_count(1).await.unwrap();
        let models = store.model_scores().await.unwrap();
        assert_eq!(models[0].vote_count, 1);

        let regulation = Regulation {
            id: "reg-1".to_string(),
            title: "EU AI Act".to_string(),
            region: "EU".to_string(),
            status: RegulationStatus::Enacted,
            impact: Impact::High,
            deadline: Some(NaiveDate::from_ymd_opt(2026, 8, 2).unwrap()),
            description: "Full enforcement".to_string(),
            source_url: "https://example.eu".to_string(),
            sort_order: 1,
        };
        store.put_regulation(&regulation).await.unwrap();
        let regulations = store.regulations().await.unwrap();
        assert_eq!(regulations[0], regulation);

        store
            .put_timeline_event(&TimelineEvent {
                year: "2026".to_string(),
                quarter: Some("Q3".to_string()),
                title: "Now".to_string(),
                description: "Present day".to_string(),
                kind: TimelineKind::Present,
                sort_order: 2,
            })
            .await
            .unwrap();
        store
            .put_timeline_event(&TimelineEvent {
                year: "2024".to_string(),
                quarter: None,
                title: "Then".to_string(),
                description: "The before times".to_string(),
                kind: TimelineKind::Past,
                sort_order: 1,
            })
            .await
            .unwrap();
        let events = store.timeline_events().await.unwrap();
        assert_eq!(events[0].title, "Then");
        assert_eq!(events[1].kind, TimelineKind::Present);

        store
            .put_voice(&Voice {
                name: "Ada".to_string(),
                title: "Researcher".to_string(),
                company: "Lab".to_string(),
                avatar: String::new(),
                quote: "Scaling is not enough".to_string(),
                article_link: None,
                sort_order: 1,
            })
            .await
            .unwrap();
        assert_eq!(store.voices().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn persists_to_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pulse.db");

        {
            let store = SqliteStore::new_with_path(&path).await.unwrap();
            store.upsert_article(&article("persisted", 1)).await.unwrap();
        }

        let reopened = SqliteStore::new_with_path(&path).await.unwrap();
        assert!(reopened.get_by_id("persisted").await.unwrap().is_some());
        assert!(reopened.capabilities().popularity_ordering);
    }
}
