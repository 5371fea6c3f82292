use std::{collections::BTreeMap, num::NonZeroU32, sync::Arc, time::Duration};

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::AppResult, genres, models::MovieMetadata};

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("metadata request failed: {0}")]
    Transport(#[from] wreq::Error),
    #[error("metadata response is not a valid record: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A single lookup against the metadata API. Retrying is the caller's job.
#[async_trait]
pub trait MetadataApi: Send + Sync {
    async fn lookup(&self, title: &str, year: Option<i32>) -> Result<Value, FetchError>;
}

pub struct OmdbClient {
    client: wreq::Client,
    api_key: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl OmdbClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration, rps: u32) -> AppResult<Self> {
        let client = wreq::Client::builder().timeout(timeout).build()?;
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN),
        )));
        Ok(Self { client, api_key, base_url, limiter })
    }
}

#[async_trait]
impl MetadataApi for OmdbClient {
    async fn lookup(&self, title: &str, year: Option<i32>) -> Result<Value, FetchError> {
        self.limiter.until_ready().await;

        let mut req = self
            .client
            .get(self.base_url.as_str())
            .query(&[("apikey", self.api_key.as_str()), ("t", title)]);
        if let Some(year) = year {
            req = req.query(&[("y", year)]);
        }

        // OMDb reports misses in the body, so the status code is not checked.
        let body = req.send().await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Raw OMDb response. Unmodelled fields are kept so the record can be cached as-is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OmdbRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "imdbID", skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_office: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl OmdbRecord {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Record used when every attempt failed before a response came back.
    pub fn failed() -> Self {
        Self {
            response: Some("False".to_string()),
            error: Some("Failed after retries".to_string()),
            ..Default::default()
        }
    }

    pub fn is_found(&self) -> bool {
        self.response.as_deref() == Some("True")
    }

    pub fn metadata(&self) -> Option<MovieMetadata> {
        if !self.is_found() {
            return None;
        }

        Some(MovieMetadata {
            imdb_id: available(self.imdb_id.as_deref()).map(str::to_string),
            runtime_minutes: self.runtime.as_deref().and_then(parse_runtime),
            plot: available(self.plot.as_deref()).map(str::to_string),
            box_office: self.box_office.as_deref().and_then(parse_box_office),
            genres: self.genre.as_deref().map(genres::parse_api_genres).unwrap_or_default(),
            directors: self.director.as_deref().map(genres::parse_directors).unwrap_or_default(),
        })
    }
}

fn available(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty() && *s != NOT_AVAILABLE)
}

/// `"142 min"` -> 142. Anything else is unknown.
fn parse_runtime(s: &str) -> Option<i32> {
    if !s.contains("min") {
        return None;
    }
    s.split_whitespace().next()?.parse().ok()
}

/// `"$28,767,189"` -> 28767189 whole dollars.
fn parse_box_office(s: &str) -> Option<i64> {
    let digits: String =
        available(Some(s))?.chars().filter(|c| !matches!(c, '$' | ',')).collect();
    digits.parse().ok()
}
