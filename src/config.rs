use std::{path::PathBuf, time::Duration};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub omdb_api_key: String,
    pub omdb_base_url: String,
    pub omdb_timeout: Duration,
    pub omdb_rps: u32,
    pub retry_base: Duration,
    pub database_url: String,
    pub movies_csv: PathBuf,
    pub ratings_csv: PathBuf,
    /// `None` keeps lookups in memory for this run only (`CACHE_DIR=""`).
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let omdb_api_key = lookup("OMDB_API_KEY").unwrap_or_default();
        if omdb_api_key.trim().is_empty() {
            anyhow::bail!("OMDB_API_KEY not found in environment. Set it before running.");
        }

        let var_or =
            |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let omdb_base_url = var_or("OMDB_BASE_URL", "http://www.omdbapi.com/");

        let omdb_timeout_secs: u64 = parse_var(&lookup, "OMDB_TIMEOUT_SECS", 8)?;
        let omdb_rps: u32 = parse_var(&lookup, "OMDB_RPS", 10)?;
        let retry_base_ms: u64 = parse_var(&lookup, "OMDB_RETRY_BASE_MS", 1000)?;

        let database_url = var_or("DATABASE_URL", "sqlite://movies.db?mode=rwc");
        let movies_csv = var_or("MOVIES_CSV", "movies.csv");
        let ratings_csv = var_or("RATINGS_CSV", "ratings.csv");
        let cache_dir = var_or("CACHE_DIR", "cache");

        Ok(Self {
            omdb_api_key,
            omdb_base_url,
            omdb_timeout: Duration::from_secs(omdb_timeout_secs),
            omdb_rps,
            retry_base: Duration::from_millis(retry_base_ms),
            database_url,
            movies_csv: movies_csv.into(),
            ratings_csv: ratings_csv.into(),
            cache_dir: (!cache_dir.trim().is_empty()).then(|| cache_dir.into()),
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().with_context(|| format!("{name}={raw:?}")),
        None => Ok(default),
    }
}
