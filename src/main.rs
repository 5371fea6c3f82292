mod cache;
mod config;
mod db;
mod entities;
mod error;
mod fetcher;
mod genres;
mod input;
mod linker;
mod models;
mod omdb;
mod pipeline;
mod ratings;
mod title;

use crate::{
    cache::{FileStore, MemoryStore, MetadataStore},
    config::Config,
    fetcher::{MetadataFetcher, RetryPolicy},
    omdb::OmdbClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,movielinker=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let store: Box<dyn MetadataStore> = match &config.cache_dir {
        Some(dir) => {
            let store = FileStore::open(dir.clone()).await?;
            tracing::info!(dir = %store.dir().display(), "using metadata cache");
            Box::new(store)
        },
        None => {
            tracing::warn!("CACHE_DIR is empty, metadata lookups will not be persisted");
            Box::new(MemoryStore::new())
        },
    };

    let omdb = OmdbClient::new(
        config.omdb_api_key.clone(),
        config.omdb_base_url.clone(),
        config.omdb_timeout,
        config.omdb_rps,
    )?;
    let fetcher =
        MetadataFetcher::new(Box::new(omdb), store, RetryPolicy::new(config.retry_base));

    let catalog = input::read_catalog_file(&config.movies_csv)?;
    let ratings = input::read_ratings_file(&config.ratings_csv)?;
    tracing::info!(
        movies = catalog.len(),
        ratings = ratings.len(),
        database = %config.database_url,
        "inputs loaded"
    );

    let db = db::connect(&config.database_url).await?;
    pipeline::run(&db, &fetcher, &catalog, &ratings).await?;

    Ok(())
}
