use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/articles/:key", get(handlers::get_article))
        .route("/api/articles/:key/related", get(handlers::related_articles))
        .route("/api/articles/:key/view", post(handlers::record_view))
        .route("/api/sections/hero", get(handlers::hero_section))
        .route("/api/sections/featured", get(handlers::featured_section))
        .route("/api/sections/breaking", get(handlers::breaking_section))
        .route("/api/sections/popular", get(handlers::popular_section))
        .route("/api/browse", get(handlers::browse))
        .route("/api/tags/trending", get(handlers::trending_tags))
        .route("/api/search", get(handlers::search))
        .route("/api/models", get(handlers::model_leaderboard))
        .route("/api/models/:id/vote", post(handlers::vote_for_model))
        .route("/api/regulations", get(handlers::regulations))
        .route("/api/timeline", get(handlers::timeline))
        .route("/api/voices", get(handlers::voices))
        .route("/api/home", get(handlers::home))
        .route("/api/newsletter/stats", get(handlers::newsletter_stats))
        .route("/api/subscribe", post(handlers::subscribe))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::AppState;
    pub use pulse_core::{Article, Error, Result};
}
