use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{debug, info};

use crate::{
    db,
    error::AppResult,
    fetcher::MetadataFetcher,
    genres::{merge_genres, parse_catalog_genres},
    linker::{self, MovieUpsert},
    models::{CatalogRow, RatingRow},
    ratings, title,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ratings_loaded: usize,
    pub movies_processed: usize,
    /// Movies the metadata API returned a match for.
    pub movies_matched: usize,
    pub genre_links: usize,
    pub director_links: usize,
}

struct MovieOutcome {
    matched: bool,
    genre_links: usize,
    director_links: usize,
}

/// Loads ratings, then enriches and stores every catalog row in file order.
///
/// Ratings are committed as one batch before enrichment starts. Each movie is committed
/// on its own, so an error stops the run without losing the movies already written, and
/// a re-run picks up where it left off since every write is idempotent.
pub async fn run(
    db: &DatabaseConnection,
    fetcher: &MetadataFetcher,
    catalog: &[CatalogRow],
    ratings: &[RatingRow],
) -> AppResult<RunSummary> {
    db::ensure_schema(db).await?;

    let mut summary = RunSummary::default();

    info!(rows = ratings.len(), "loading ratings");
    let txn = db.begin().await?;
    summary.ratings_loaded = ratings::load_ratings(&txn, ratings).await?;
    txn.commit().await?;

    info!(rows = catalog.len(), "enriching movies");
    for row in catalog {
        let outcome = enrich_movie(db, fetcher, row).await.map_err(|err| {
            err.context(format!("movie {} ({})", row.movie_id, row.title))
        })?;

        summary.movies_processed += 1;
        summary.movies_matched += usize::from(outcome.matched);
        summary.genre_links += outcome.genre_links;
        summary.director_links += outcome.director_links;
    }

    info!(
        ratings = summary.ratings_loaded,
        movies = summary.movies_processed,
        matched = summary.movies_matched,
        genre_links = summary.genre_links,
        director_links = summary.director_links,
        "run complete"
    );

    Ok(summary)
}

async fn enrich_movie(
    db: &DatabaseConnection,
    fetcher: &MetadataFetcher,
    row: &CatalogRow,
) -> AppResult<MovieOutcome> {
    let parsed = title::parse_title(&row.title);
    let record = fetcher.fetch(&parsed.title, parsed.year).await;

    let metadata = record.metadata();
    let matched = metadata.is_some();
    if !matched {
        debug!(title = %parsed.title, year = ?parsed.year, error = ?record.error, "no metadata match");
    }
    let metadata = metadata.unwrap_or_default();

    let catalog_genres = row.genres.as_deref().map(parse_catalog_genres).unwrap_or_default();
    let genres = merge_genres(&catalog_genres, &metadata.genres);

    let movie = MovieUpsert {
        identity: metadata.imdb_id.clone().unwrap_or_else(|| row.fallback_identity()),
        title: parsed.title,
        year: parsed.year,
        runtime_minutes: metadata.runtime_minutes,
        plot: metadata.plot,
        box_office: metadata.box_office,
    };

    debug!(movie_id = row.movie_id, identity = %movie.identity, matched, "storing movie");

    let txn = db.begin().await?;
    let movie_row = linker::upsert_movie(&txn, &movie).await?;
    for name in &genres {
        let genre_id = linker::get_or_create_genre(&txn, name).await?;
        linker::link_movie_genre(&txn, movie_row, genre_id).await?;
    }
    for name in &metadata.directors {
        let director_id = linker::get_or_create_director(&txn, name).await?;
        linker::link_movie_director(&txn, movie_row, director_id).await?;
    }
    txn.commit().await?;

    Ok(MovieOutcome { matched, genre_links: genres.len(), director_links: metadata.directors.len() })
}
