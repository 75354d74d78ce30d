use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use pulse_core::{Article, CategoryFilter, Regulation, ScoreDimension, SubscribeError, TagCount};
use pulse_feed::{rank_models, sort_section, SectionSort};

use crate::AppState;

const DEFAULT_LIST_LIMIT: usize = 20;
const DEFAULT_PAGE_SIZE: usize = 12;
const DEFAULT_RELATED_LIMIT: usize = 3;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    limit: Option<usize>,
    category: Option<String>,
    tag: Option<String>,
    sort: Option<String>,
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let articles = if let Some(tag) = &params.tag {
        state.feed.by_tag(tag, limit).await
    } else if let Some(category) = &params.category {
        state.feed.by_category(category, limit).await
    } else {
        state.feed.recent(limit).await
    };
    let articles = match params.sort.as_deref().map(str::parse::<SectionSort>) {
        Some(Ok(sort)) => sort_section(&articles, sort),
        _ => articles,
    };
    Json(articles)
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not_found" }))).into_response()
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    match state.feed.article_by_slug_or_id(&key).await {
        Some(article) => Json(article).into_response(),
        None => not_found(),
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitParam {
    limit: Option<usize>,
}

pub async fn related_articles(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(params): Query<LimitParam>,
) -> Response {
    let Some(article) = state.feed.article_by_slug_or_id(&key).await else {
        return not_found();
    };
    let related = state
        .feed
        .related(
            &article.tags,
            &article.id,
            &article.category,
            params.limit.unwrap_or(DEFAULT_RELATED_LIMIT),
        )
        .await;
    Json(related).into_response()
}

pub async fn hero_section(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParam>,
) -> impl IntoResponse {
    Json(state.feed.hero(params.limit.unwrap_or(3)).await)
}

pub async fn featured_section(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParam>,
) -> impl IntoResponse {
    Json(state.feed.featured(params.limit.unwrap_or(3)).await)
}

pub async fn breaking_section(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParam>,
) -> impl IntoResponse {
    Json(state.feed.breaking(params.limit.unwrap_or(5)).await)
}

pub async fn popular_section(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParam>,
) -> impl IntoResponse {
    Json(state.feed.most_popular(params.limit.unwrap_or(5)).await)
}

#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    category: Option<String>,
    offset: Option<usize>,
    size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct BrowsePage {
    articles: Vec<Article>,
    has_more: bool,
}

pub async fn browse(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BrowseParams>,
) -> impl IntoResponse {
    let filter = CategoryFilter::parse(params.category.as_deref().unwrap_or("all"));
    let size = params.size.unwrap_or(DEFAULT_PAGE_SIZE);
    let articles = state
        .feed
        .paged(&filter, params.offset.unwrap_or(0), size)
        .await;
    // A full page may still be the last one; the next request comes back
    // empty and settles it.
    let has_more = articles.len() == size && size > 0;
    Json(BrowsePage { articles, has_more })
}

pub async fn trending_tags(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParam>,
) -> impl IntoResponse {
    Json(state.feed.trending_tags(params.limit.unwrap_or(20)).await)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Json(Vec::<Article>::new());
    }
    Json(state.feed.search_headline(query.trim()).await)
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    dimension: Option<String>,
}

pub async fn model_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardParams>,
) -> impl IntoResponse {
    let dimension = params
        .dimension
        .as_deref()
        .and_then(|raw| raw.parse::<ScoreDimension>().ok())
        .unwrap_or(ScoreDimension::Overall);
    let models = state.feed.models().await;
    Json(rank_models(&models, dimension))
}

#[derive(Debug, Serialize)]
pub struct RegulationView {
    #[serde(flatten)]
    regulation: Regulation,
    days_remaining: Option<i64>,
    progress: Option<f64>,
}

pub async fn regulations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = Utc::now();
    let views: Vec<RegulationView> = state
        .feed
        .regulations()
        .await
        .into_iter()
        .map(|regulation| RegulationView {
            days_remaining: regulation.days_remaining(now),
            progress: regulation.progress(now),
            regulation,
        })
        .collect();
    Json(views)
}

pub async fn timeline(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.feed.timeline().await)
}

pub async fn voices(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.feed.voices().await)
}

#[derive(Debug, Serialize)]
pub struct HomePayload {
    hero: Vec<Article>,
    breaking: Vec<Article>,
    featured: Vec<Article>,
    most_popular: Vec<Article>,
    trending_tags: Vec<TagCount>,
}

/// Assembles the front page. Section fetches run concurrently; a failed
/// section renders empty rather than taking the page down.
pub async fn home(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let feed = &state.feed;
    let (hero, breaking, featured, most_popular, trending) = tokio::join!(
        feed.hero(3),
        feed.breaking(5),
        feed.featured(3),
        feed.most_popular(5),
        feed.trending_tags(8),
    );
    Json(HomePayload {
        hero,
        breaking,
        featured,
        most_popular,
        trending_tags: trending,
    })
}

/// Fire-and-forget; always 204 so a missing counter never surfaces.
pub async fn record_view(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> StatusCode {
    if let Some(article) = state.feed.article_by_slug_or_id(&key).await {
        state.feed.record_view(&article.id).await;
    }
    StatusCode::NO_CONTENT
}

/// Fire-and-forget, same contract as `record_view`. The at-most-once
/// guard is client-side state, not enforced here.
pub async fn vote_for_model(
    State(state): State<Arc<AppState>>,
    Path(model_id): Path<i64>,
) -> StatusCode {
    state.feed.cast_vote(model_id).await;
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    email: String,
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubscribeRequest>,
) -> Response {
    match state.feed.subscribe(&request.email).await {
        Ok(()) => Json(json!({ "subscribed": true })).into_response(),
        Err(SubscribeError::InvalidEmail) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "invalid_email" })),
        )
            .into_response(),
        Err(SubscribeError::Failed(_)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "subscription_failed" })),
        )
            .into_response(),
    }
}

pub async fn newsletter_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "total": state.feed.subscriber_count().await }))
}
