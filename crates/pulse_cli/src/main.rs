use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use pulse_core::{Article, ContentStore, ModelScore, Regulation, Result, TimelineEvent, Voice};
use pulse_feed::ContentFeed;
use pulse_web::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Storage backend to use (memory or sqlite).
    #[arg(long, default_value = "sqlite")]
    storage: String,
    /// Database file for the sqlite backend.
    #[arg(long)]
    db_path: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
    },
    /// Load curated content from a JSON seed file.
    Import { file: PathBuf },
    /// Print the most recent articles.
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Search headlines, categories and tags.
    Search { query: String },
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SeedFile {
    articles: Vec<Article>,
    models: Vec<ModelScore>,
    regulations: Vec<Regulation>,
    timeline: Vec<TimelineEvent>,
    voices: Vec<Voice>,
}

async fn check_storage(storage: &Arc<dyn ContentStore>, storage_type: &str) -> Result<()> {
    // A light read proves the connection and schema are usable.
    storage.list_recent(1).await?;
    let capabilities = storage.capabilities();
    info!(
        "💾 Storage backend ready (using {}, popularity ordering: {})",
        storage_type, capabilities.popularity_ordering
    );
    Ok(())
}

async fn import(storage: &Arc<dyn ContentStore>, file: &PathBuf) -> Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let seed: SeedFile = serde_json::from_str(&raw)?;

    let mut imported = 0usize;
    for mut article in seed.articles {
        if article.headline.is_empty() {
            warn!("skipping article without a headline");
            continue;
        }
        if article.id.is_empty() {
            article.id = uuid::Uuid::new_v4().to_string();
        }
        storage.upsert_article(&article).await?;
        imported += 1;
    }
    for model in &seed.models {
        storage.put_model_score(model).await?;
    }
    for regulation in &seed.regulations {
        storage.put_regulation(regulation).await?;
    }
    for event in &seed.timeline {
        storage.put_timeline_event(event).await?;
    }
    for voice in &seed.voices {
        storage.put_voice(voice).await?;
    }

    info!(
        "✨ Imported {} articles, {} models, {} regulations, {} timeline events, {} voices",
        imported,
        seed.models.len(),
        seed.regulations.len(),
        seed.timeline.len(),
        seed.voices.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let storage = pulse_storage::create_storage(&cli.storage, cli.db_path.as_deref()).await?;
    check_storage(&storage, &cli.storage).await?;

    match cli.command {
        Commands::Serve { addr } => {
            let feed = ContentFeed::new(storage.clone());
            let app = pulse_web::create_app(AppState { feed }).await;
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("📰 Serving on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Import { file } => {
            import(&storage, &file).await?;
        }
        Commands::Recent { limit } => {
            let feed = ContentFeed::new(storage);
            for article in feed.recent(limit).await {
                let date = article
                    .published_label()
                    .unwrap_or_else(|| "undated".to_string());
                println!("{}  [{}]  {}", date, article.category, article.headline);
            }
        }
        Commands::Search { query } => {
            let feed = ContentFeed::new(storage);
            let cache = pulse_client::SearchCache::new();
            let results = pulse_client::run_search(&feed, &cache, &query).await;
            if results.is_empty() {
                println!("No articles found for \"{}\"", query);
            } else {
                for article in results {
                    println!("[{}]  {}", article.category, article.headline);
                }
            }
        }
    }

    Ok(())
}
