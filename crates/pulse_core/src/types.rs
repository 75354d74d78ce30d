use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub name: String,
    pub url: String,
    pub favicon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    pub id: String,
    pub slug: Option<String>,
    pub headline: String,
    pub excerpt: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
    /// Empty string when the article has no image.
    pub image: String,
    pub category: String,
    pub author: Option<String>,
    pub read_time: String,
    pub published_at: Option<DateTime<Utc>>,
    pub original_url: Option<String>,
    pub is_exclusive: bool,
    pub is_featured: bool,
    pub is_breaking: bool,
    pub source: Option<ArticleSource>,
    /// Lowercase hyphenated slugs, ordered.
    pub tags: Vec<String>,
    pub key_points: Vec<String>,
    pub why_it_matters: Option<String>,
    pub view_count: i64,
}

impl Article {
    pub const DEFAULT_READ_TIME: &'static str = "3 min read";

    /// Display label for the publication date, e.g. "Aug 7, 2026".
    pub fn published_label(&self) -> Option<String> {
        self.published_at
            .map(|at| at.format("%b %-d, %Y").to_string())
    }

    /// Canonical URL key, preferring the slug over the raw id.
    pub fn path_key(&self) -> &str {
        self.slug.as_deref().unwrap_or(&self.id)
    }

    /// Masthead eligibility: has an image and carries at least one flag.
    pub fn is_hero_eligible(&self) -> bool {
        !self.image.is_empty() && (self.is_featured || self.is_breaking || self.is_exclusive)
    }
}

impl Default for Article {
    fn default() -> Self {
        Self {
            id: String::new(),
            slug: None,
            headline: String::new(),
            excerpt: None,
            summary: None,
            body: None,
            image: String::new(),
            category: String::new(),
            author: None,
            read_time: Self::DEFAULT_READ_TIME.to_string(),
            published_at: None,
            original_url: None,
            is_exclusive: false,
            is_featured: false,
            is_breaking: false,
            source: None,
            tags: Vec::new(),
            key_points: Vec::new(),
            why_it_matters: None,
            view_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Same,
}

/// Which benchmark axis a leaderboard is ranked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreDimension {
    Overall,
    Coding,
    Reasoning,
    Creative,
}

impl std::str::FromStr for ScoreDimension {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overall" => Ok(Self::Overall),
            "coding" => Ok(Self::Coding),
            "reasoning" => Ok(Self::Reasoning),
            "creative" => Ok(Self::Creative),
            other => Err(format!("unknown score dimension: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub id: i64,
    pub name: String,
    pub company: String,
    pub score_overall: f64,
    pub score_coding: f64,
    pub score_reasoning: f64,
    pub score_creative: f64,
    pub context_window: String,
    pub highlight: Option<String>,
    pub trend: Trend,
    pub vote_count: i64,
    pub updated_at: DateTime<Utc>,
}

impl ModelScore {
    pub fn score(&self, dimension: ScoreDimension) -> f64 {
        match dimension {
            ScoreDimension::Overall => self.score_overall,
            ScoreDimension::Coding => self.score_coding,
            ScoreDimension::Reasoning => self.score_reasoning,
            ScoreDimension::Creative => self.score_creative,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegulationStatus {
    Enacted,
    Pending,
    Proposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

/// Run-up window used for the deadline progress bar, in 30-day months.
pub const REGULATION_WINDOW_MONTHS: i64 = 18;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regulation {
    pub id: String,
    pub title: String,
    pub region: String,
    pub status: RegulationStatus,
    pub impact: Impact,
    pub deadline: Option<NaiveDate>,
    pub description: String,
    pub source_url: String,
    pub sort_order: i64,
}

impl Regulation {
    /// Whole days until the deadline, clamped at zero. None without a deadline.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        let deadline = self.deadline?;
        let end = deadline.and_hms_opt(0, 0, 0)?.and_utc();
        let secs = (end - now).num_seconds() as f64;
        Some((secs / 86_400.0).ceil().max(0.0) as i64)
    }

    /// Fraction of the run-up window already elapsed, clamped to [0.05, 1.0].
    pub fn progress(&self, now: DateTime<Utc>) -> Option<f64> {
        let days = self.days_remaining(now)? as f64;
        let total = (REGULATION_WINDOW_MONTHS * 30) as f64;
        Some(((total - days) / total).clamp(0.05, 1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineKind {
    Past,
    Present,
    Future,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub year: String,
    pub quarter: Option<String>,
    pub title: String,
    pub description: String,
    pub kind: TimelineKind,
    pub sort_order: i64,
}

/// Curated pull quote shown alongside the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub title: String,
    pub company: String,
    pub avatar: String,
    pub quote: String,
    pub article_link: Option<String>,
    pub sort_order: i64,
}

/// Tag occurrence count over a bounded recency window. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}
