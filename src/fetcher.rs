use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    cache::{MetadataStore, cache_key},
    omdb::{FetchError, MetadataApi, OmdbRecord},
};

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base: Duration,
}

impl RetryPolicy {
    pub fn new(base: Duration) -> Self {
        Self { attempts: 4, base }
    }

    /// Wait after failed attempt `attempt` (0-based): `base * 2^attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Cache-first metadata lookups.
///
/// Any response the API produces is cached, "not found" included. Transport and parse
/// failures are retried and, once attempts run out, degrade to [`OmdbRecord::failed`]
/// which is deliberately not cached so the next run tries again.
pub struct MetadataFetcher {
    api: Box<dyn MetadataApi>,
    store: Box<dyn MetadataStore>,
    retry: RetryPolicy,
}

impl MetadataFetcher {
    pub fn new(
        api: Box<dyn MetadataApi>,
        store: Box<dyn MetadataStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self { api, store, retry }
    }

    pub async fn fetch(&self, title: &str, year: Option<i32>) -> OmdbRecord {
        let key = cache_key(title, year);

        if let Some(record) = self.cached(&key).await {
            debug!(key = %key, "metadata cache hit");
            return record;
        }

        for attempt in 0..self.retry.attempts {
            match self.lookup_once(title, year).await {
                Ok((raw, record)) => {
                    debug!(title = %title, year = ?year, attempt, found = record.is_found(), "fetched metadata");
                    if let Err(err) = self.store.put(&key, &raw).await {
                        warn!(key = %key, error = %err, "failed to cache metadata");
                    }
                    return record;
                },
                Err(err) => {
                    warn!(title = %title, year = ?year, attempt, error = %err, "metadata lookup failed");
                    if attempt + 1 < self.retry.attempts {
                        tokio::time::sleep(self.retry.delay(attempt)).await;
                    }
                },
            }
        }

        warn!(title = %title, year = ?year, "giving up on metadata lookup");
        OmdbRecord::failed()
    }

    async fn cached(&self, key: &str) -> Option<OmdbRecord> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(key = %key, error = %err, "unreadable metadata cache entry");
                return None;
            },
        };
        match OmdbRecord::from_value(raw) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(key = %key, error = %err, "malformed metadata cache entry");
                None
            },
        }
    }

    async fn lookup_once(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<(Value, OmdbRecord), FetchError> {
        let raw = self.api.lookup(title, year).await?;
        let record = OmdbRecord::from_value(raw.clone())?;
        Ok((raw, record))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        collections::{HashMap, VecDeque},
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::cache::MemoryStore;

    pub(crate) fn parse_failure() -> FetchError {
        FetchError::Parse(serde_json::from_str::<Value>("<html>gateway timeout</html>").unwrap_err())
    }

    /// Replays scripted outcomes in order, then answers from `by_title`, else "not found".
    #[derive(Clone, Default)]
    pub(crate) struct FakeApi {
        pub calls: Arc<AtomicUsize>,
        script: Arc<Mutex<VecDeque<Result<Value, FetchError>>>>,
        by_title: Arc<HashMap<String, Value>>,
    }

    impl FakeApi {
        pub(crate) fn scripted(script: Vec<Result<Value, FetchError>>) -> Self {
            Self { script: Arc::new(Mutex::new(script.into())), ..Default::default() }
        }

        pub(crate) fn with_titles(titles: Vec<(&str, Value)>) -> Self {
            let by_title = titles.into_iter().map(|(t, v)| (t.to_string(), v)).collect();
            Self { by_title: Arc::new(by_title), ..Default::default() }
        }
    }

    #[async_trait]
    impl MetadataApi for FakeApi {
        async fn lookup(&self, title: &str, _year: Option<i32>) -> Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                return next;
            }
            Ok(self
                .by_title
                .get(title)
                .cloned()
                .unwrap_or_else(|| json!({"Response": "False", "Error": "Movie not found!"})))
        }
    }

    /// Shares one `MemoryStore` between the fetcher and the test.
    struct SharedStore(Arc<MemoryStore>);

    #[async_trait]
    impl MetadataStore for SharedStore {
        async fn get(&self, key: &str) -> crate::error::AppResult<Option<Value>> {
            self.0.get(key).await
        }

        async fn put(&self, key: &str, value: &Value) -> crate::error::AppResult<()> {
            self.0.put(key, value).await
        }
    }

    fn fetcher(api: FakeApi, store: Arc<MemoryStore>) -> MetadataFetcher {
        MetadataFetcher::new(
            Box::new(api),
            Box::new(SharedStore(store)),
            RetryPolicy::new(Duration::from_secs(1)),
        )
    }

    fn toy_story() -> Value {
        json!({"Response": "True", "Title": "Toy Story", "imdbID": "tt0114709", "Runtime": "81 min"})
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let retry = RetryPolicy::new(Duration::from_secs(1));
        let delays: Vec<_> = (0..4).map(|a| retry.delay(a).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8]);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_three_failures_following_backoff() {
        let api = FakeApi::scripted(vec![
            Err(parse_failure()),
            Err(parse_failure()),
            Err(parse_failure()),
            Ok(toy_story()),
        ]);
        let store = Arc::new(MemoryStore::new());
        let fetcher = fetcher(api.clone(), store.clone());

        let started = tokio::time::Instant::now();
        let record = fetcher.fetch("Toy Story", Some(1995)).await;

        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(1 + 2 + 4), "waited {waited:?}");
        assert!(waited < Duration::from_secs(8), "waited {waited:?}");
        assert_eq!(api.calls.load(Ordering::SeqCst), 4);
        assert_eq!(record.imdb_id.as_deref(), Some("tt0114709"));
        assert_eq!(store.get("Toy Story__1995").await.unwrap(), Some(toy_story()));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_return_failure_without_caching() {
        let api = FakeApi::scripted((0..4).map(|_| Err(parse_failure())).collect());
        let store = Arc::new(MemoryStore::new());
        let fetcher = fetcher(api.clone(), store.clone());

        let record = fetcher.fetch("Heat", None).await;

        assert_eq!(record, OmdbRecord::failed());
        assert_eq!(api.calls.load(Ordering::SeqCst), 4);
        assert_eq!(store.len(), 0);

        // Nothing was cached, so the next fetch goes back to the API.
        let record = fetcher.fetch("Heat", None).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 5);
        assert_eq!(record.error.as_deref(), Some("Movie not found!"));
    }

    #[tokio::test]
    async fn not_found_is_cached_and_not_retried() {
        let api = FakeApi::default();
        let store = Arc::new(MemoryStore::new());
        let fetcher = fetcher(api.clone(), store.clone());

        let first = fetcher.fetch("Nope", Some(2001)).await;
        let second = fetcher.fetch("Nope", Some(2001)).await;

        assert!(!first.is_found());
        assert_eq!(first, second);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let api = FakeApi::with_titles(vec![("Toy Story", toy_story())]);
        let store = Arc::new(MemoryStore::new());
        let fetcher = fetcher(api.clone(), store);

        let first = fetcher.fetch("Toy Story", Some(1995)).await;
        let second = fetcher.fetch("Toy Story", Some(1995)).await;

        assert!(first.is_found());
        assert_eq!(first, second);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_cache_entry_is_refetched() {
        let api = FakeApi::with_titles(vec![("Toy Story", toy_story())]);
        let store = Arc::new(MemoryStore::new());
        store.put("Toy Story__1995", &json!("garbage")).await.unwrap();
        let fetcher = fetcher(api.clone(), store);

        let record = fetcher.fetch("Toy Story", Some(1995)).await;

        assert!(record.is_found());
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }
}
