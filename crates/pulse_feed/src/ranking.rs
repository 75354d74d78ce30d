use pulse_core::{Article, ModelScore, ScoreDimension};

/// Sort keys a section can toggle between after a batch is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionSort {
    Latest,
    Trending,
    Popular,
}

impl std::str::FromStr for SectionSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "trending" => Ok(Self::Trending),
            "popular" => Ok(Self::Popular),
            other => Err(format!("unknown sort: {}", other)),
        }
    }
}

/// Pure re-sort of an already-fetched batch. Input order is recency order
/// from upstream; the input is never mutated.
pub fn sort_section(articles: &[Article], sort: SectionSort) -> Vec<Article> {
    let mut sorted = articles.to_vec();
    match sort {
        SectionSort::Latest => {}
        // Simple proxy, not a real trend signal.
        SectionSort::Trending => sorted.reverse(),
        // Stable: featured first, original order preserved otherwise.
        SectionSort::Popular => sorted.sort_by_key(|a| !a.is_featured),
    }
    sorted
}

/// Category-match heuristics for pages where the store-side filter is too
/// narrow: free-text categories are matched by keyword family.
pub fn matches_category(article: &Article, slug: &str) -> bool {
    let cat = article.category.to_lowercase();
    match slug {
        "models" => ["model", "llm", "benchmark", "research"]
            .iter()
            .any(|k| cat.contains(k)),
        "agents" => cat.contains("agent"),
        "industry" => ["industry", "healthcare", "finance", "legal"]
            .iter()
            .any(|k| cat.contains(k)),
        "coding" => cat.contains("coding") || cat.contains("code"),
        "regulation" => cat.contains("regulation") || cat.contains("policy"),
        "science" => ["science", "quantum", "robotics"]
            .iter()
            .any(|k| cat.contains(k)),
        "education" => cat.contains("academy") || cat.contains("education"),
        "video" => cat.contains("video") || cat.contains("demo"),
        _ => cat.contains(slug),
    }
}

/// Broader keyword families used for live topic counts.
pub fn category_keywords(slug: &str) -> &'static [&'static str] {
    match slug {
        "models" => &[
            "model", "llm", "gpt", "claude", "gemini", "deepseek", "grok", "kimi", "llama",
            "mistral",
        ],
        "agents" => &["agent", "agentic", "autonomous", "multi-agent", "swarm"],
        "coding" => &["coding", "code", "developer", "copilot", "cursor"],
        "regulation" => &["regulat", "policy", "legal", "compliance", "act", "executive order"],
        "industry" => &[
            "industry",
            "enterprise",
            "business",
            "finance",
            "healthcare",
            "manufacturing",
        ],
        "education" => &["education", "academy", "tutorial", "learn", "course"],
        _ => &[],
    }
}

/// How many of `articles` fall under the slug's keyword family.
pub fn count_for_slug(articles: &[Article], slug: &str) -> usize {
    let keywords = category_keywords(slug);
    articles
        .iter()
        .filter(|a| {
            let cat = a.category.to_lowercase();
            if keywords.is_empty() {
                cat.contains(slug)
            } else {
                keywords.iter().any(|k| cat.contains(k))
            }
        })
        .count()
}

const UPPERCASE_TAGS: &[&str] = &[
    "openai", "gpt", "llm", "ai", "api", "agi", "gpu", "tpu", "llms", "rlhf",
];

/// Display label for a tag slug: "agent-swarm" -> "Agent Swarm",
/// acronym-ish words fully uppercased.
pub fn format_tag_label(tag: &str) -> String {
    tag.split('-')
        .map(|word| {
            if UPPERCASE_TAGS.contains(&word.to_lowercase().as_str()) {
                word.to_uppercase()
            } else {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strict descending sort on the chosen dimension; ties keep input order.
pub fn rank_models(models: &[ModelScore], dimension: ScoreDimension) -> Vec<ModelScore> {
    let mut ranked = models.to_vec();
    ranked.sort_by(|a, b| {
        b.score(dimension)
            .partial_cmp(&a.score(dimension))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}
