// Activity retrieval service.
// Reads through the cache, fetches pages on a miss, and feeds the pipeline.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::cache::paths;
use crate::cache::{CacheBackend, CacheStore, FileBackend};
use crate::error::{ActivityError, Result};
use crate::github::{
    EventRecord, FetchRequest, GitHubClient, HttpTransport, MAX_EVENT_PAGES, MAX_PAGE_SIZE,
    ReqwestTransport, UserProfile,
};

use super::pipeline::{ProcessOptions, process};

/// Events per page requested from the API unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Cache-through access to a user's profile and public activity.
pub struct ActivityService<B: CacheBackend = FileBackend, T: HttpTransport = ReqwestTransport> {
    cache: Arc<CacheStore<B>>,
    client: GitHubClient<T>,
    page_size: u32,
    /// Skip cache reads (results are still written).
    refresh: bool,
}

impl<B: CacheBackend + 'static, T: HttpTransport> ActivityService<B, T> {
    pub fn new(cache: CacheStore<B>, client: GitHubClient<T>) -> Self {
        Self {
            cache: Arc::new(cache),
            client,
            page_size: DEFAULT_PAGE_SIZE,
            refresh: false,
        }
    }

    /// Events requested per page, kept within what the API will return.
    /// A larger request would come back capped and read as a short page.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn cache(&self) -> &CacheStore<B> {
        &self.cache
    }

    pub fn client(&self) -> &GitHubClient<T> {
        &self.client
    }

    /// A user's profile, from cache when fresh.
    pub async fn user_profile(&self, identity: &str) -> Result<UserProfile> {
        let key = paths::user_key(identity);
        if let Some(user) = self.cached(&key).await {
            return Ok(user);
        }

        let user = self.client.fetch_user(identity).await?;
        self.remember(&key, &user).await;
        Ok(user)
    }

    /// One page of events, from cache when fresh.
    pub async fn events_page(&self, request: &FetchRequest) -> Result<Vec<EventRecord>> {
        let key = paths::events_page_key(&request.identity, request.page, request.page_size);
        if let Some(events) = self.cached(&key).await {
            return Ok(events);
        }

        let events = self.client.fetch_events_page(request).await?;
        self.remember(&key, &events).await;
        Ok(events)
    }

    /// At least `wanted` of the user's most recent events, in API order,
    /// unless the user has fewer. Pages are fetched one at a time until
    /// enough are collected, a short page signals the end, or the API's
    /// page ceiling is reached.
    pub async fn recent_events(&self, identity: &str, wanted: usize) -> Result<Vec<EventRecord>> {
        let mut events = Vec::new();
        if wanted == 0 {
            return Ok(events);
        }

        let mut request = FetchRequest::new(identity, 1, self.page_size);
        loop {
            let page = self.events_page(&request).await?;
            let last_page = page.len() < self.page_size as usize;
            events.extend(page);

            if events.len() >= wanted || last_page || request.page >= MAX_EVENT_PAGES {
                break;
            }
            request = request.next_page();
        }

        debug!(identity, pages = request.page, count = events.len(), "collected events");
        Ok(events)
    }

    /// Fetch enough events for `options` and run them through the pipeline.
    ///
    /// With a type or date filter the full available history is fetched,
    /// since the limit applies after filtering.
    pub async fn activity(
        &self,
        identity: &str,
        options: &ProcessOptions,
    ) -> Result<Vec<EventRecord>> {
        let filtered =
            options.filter_kind.is_some() || options.from.is_some() || options.to.is_some();
        let wanted = match options.limit {
            Some(limit) if !filtered => limit,
            Some(_) => usize::MAX,
            None if filtered => usize::MAX,
            None => self.page_size as usize,
        };

        let raw = self.recent_events(identity, wanted).await?;
        let processed = process(&raw, options);
        info!(identity, fetched = raw.len(), kept = processed.len(), "activity ready");
        Ok(processed)
    }

    /// Drop every cached result for `identity`.
    pub async fn forget(&self, identity: &str) -> Result<usize> {
        let prefix = paths::events_prefix(identity);
        let user_key = paths::user_key(identity);
        self.with_cache(move |cache| -> Result<usize> {
            let mut removed = cache.invalidate_prefix(&prefix)?;
            if cache.invalidate(&user_key)? {
                removed += 1;
            }
            Ok(removed)
        })
        .await?
    }

    /// Drop every cached result.
    pub async fn clear_cache(&self) -> Result<()> {
        self.with_cache(|cache| cache.clear()).await?
    }

    async fn cached<D: DeserializeOwned + Send + 'static>(&self, key: &str) -> Option<D> {
        if self.refresh {
            return None;
        }
        let owned = key.to_string();
        match self
            .with_cache(move |cache| cache.get::<D>(&owned).into_option())
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!(key, error = %e, "cache read failed");
                None
            }
        }
    }

    /// Cache a fetched result. A failed write only costs a refetch later.
    async fn remember<D: Serialize + ?Sized>(&self, key: &str, data: &D) {
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize cache entry");
                return;
            }
        };
        let owned = key.to_string();
        let written = self
            .with_cache(move |cache| cache.put(&owned, &value))
            .await
            .and_then(|result| result);
        if let Err(e) = written {
            warn!(key, error = %e, "failed to write cache entry");
        }
    }

    /// Run cache file I/O on the blocking pool instead of an async worker.
    async fn with_cache<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&CacheStore<B>) -> R + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || f(&cache))
            .await
            .map_err(|e| ActivityError::Io(std::io::Error::other(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryBackend;
    use crate::github::RetryPolicy;
    use crate::github::client::testing::ScriptedTransport;
    use serde_json::json;

    type TestService = ActivityService<MemoryBackend, ScriptedTransport>;

    fn service(transport: ScriptedTransport) -> TestService {
        let client =
            GitHubClient::with_transport(transport).with_retry_policy(RetryPolicy::none());
        ActivityService::new(CacheStore::in_memory(), client)
    }

    /// A JSON page of `count` events numbered from `start`.
    fn page(start: usize, count: usize) -> String {
        let events: Vec<_> = (start..start + count)
            .map(|i| {
                json!({
                    "id": i.to_string(),
                    "type": if i % 2 == 0 { "PushEvent" } else { "WatchEvent" },
                    "repo": {"name": format!("octocat/repo-{}", i)},
                    "payload": {},
                    "created_at": format!("2024-05-01T{:02}:00:00Z", 23 - i % 24),
                })
            })
            .collect();
        serde_json::to_string(&events).unwrap()
    }

    fn ids(events: &[EventRecord]) -> Vec<String> {
        events
            .iter()
            .map(|e| e.extra["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_two_pages_then_limit() {
        let transport = ScriptedTransport::new()
            .respond(200, page(0, 5))
            .respond(200, page(5, 5));
        let service = service(transport).with_page_size(5);

        let options = ProcessOptions {
            limit: Some(8),
            ..Default::default()
        };
        let events = service.activity("octocat", &options).await.unwrap();

        assert_eq!(ids(&events), vec!["0", "1", "2", "3", "4", "5", "6", "7"]);
        assert_eq!(
            service.client().transport().requests(),
            vec![
                "https://api.github.com/users/octocat/events/public?page=1&per_page=5".to_string(),
                "https://api.github.com/users/octocat/events/public?page=2&per_page=5".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let transport = ScriptedTransport::new()
            .respond(200, page(0, 5))
            .respond(200, page(5, 5));
        let service = service(transport).with_page_size(5);

        let first = service.recent_events("octocat", 8).await.unwrap();
        let second = service.recent_events("octocat", 8).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
        assert_eq!(service.client().transport().request_count(), 2);
    }

    #[tokio::test]
    async fn test_short_page_ends_pagination() {
        let transport = ScriptedTransport::new().respond(200, page(0, 3));
        let service = service(transport).with_page_size(5);

        let events = service.recent_events("octocat", 100).await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(service.client().transport().request_count(), 1);
    }

    #[tokio::test]
    async fn test_page_ceiling() {
        let mut transport = ScriptedTransport::new();
        for p in 0..MAX_EVENT_PAGES as usize {
            transport = transport.respond(200, page(p * 2, 2));
        }
        let service = service(transport).with_page_size(2);

        let events = service.recent_events("octocat", usize::MAX).await.unwrap();
        assert_eq!(events.len(), 2 * MAX_EVENT_PAGES as usize);
        assert_eq!(
            service.client().transport().request_count(),
            MAX_EVENT_PAGES as usize
        );
    }

    #[tokio::test]
    async fn test_zero_wanted_makes_no_request() {
        let service = service(ScriptedTransport::new());
        assert!(service.recent_events("octocat", 0).await.unwrap().is_empty());
        assert_eq!(service.client().transport().request_count(), 0);
    }

    #[tokio::test]
    async fn test_filter_fetches_all_pages_before_limit() {
        let transport = ScriptedTransport::new()
            .respond(200, page(0, 5))
            .respond(200, page(5, 5))
            .respond(200, page(10, 1));
        let service = service(transport).with_page_size(5);

        let options = ProcessOptions {
            filter_kind: Some("PushEvent".into()),
            limit: Some(4),
            ..Default::default()
        };
        let events = service.activity("octocat", &options).await.unwrap();

        assert_eq!(ids(&events), vec!["0", "2", "4", "6"]);
        assert_eq!(service.client().transport().request_count(), 3);
    }

    #[tokio::test]
    async fn test_user_profile_is_cached() {
        let body = r#"{"login": "octocat", "name": "The Octocat", "public_repos": 8, "followers": 1, "following": 2}"#;
        let service = service(ScriptedTransport::new().respond(200, body));

        let first = service.user_profile("octocat").await.unwrap();
        let second = service.user_profile("octocat").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(service.client().transport().request_count(), 1);
        assert!(service.cache().entry("user-octocat").is_some());
    }

    #[tokio::test]
    async fn test_refresh_skips_cache_reads() {
        let transport = ScriptedTransport::new()
            .respond(200, page(0, 2))
            .respond(200, page(0, 2));
        let service = service(transport).with_page_size(5);

        service.recent_events("octocat", 5).await.unwrap();
        let service = service.with_refresh(true);
        service.recent_events("octocat", 5).await.unwrap();

        assert_eq!(service.client().transport().request_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let transport = ScriptedTransport::new()
            .respond(500, "")
            .respond(200, page(0, 1));
        let service = service(transport);

        let err = service.recent_events("octocat", 5).await.unwrap_err();
        assert!(matches!(err, ActivityError::RequestFailed { status: 500 }));
        assert!(service.cache().is_empty());

        let events = service.recent_events("octocat", 5).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_forget() {
        let transport = ScriptedTransport::new()
            .respond(200, page(0, 1))
            .respond(200, r#"{"login": "octocat"}"#);
        let service = service(transport);

        service.recent_events("octocat", 5).await.unwrap();
        service.user_profile("octocat").await.unwrap();
        assert_eq!(service.forget("octocat").await.unwrap(), 2);
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_forget_leaves_hyphenated_login_alone() {
        let service = service(ScriptedTransport::new());
        service.cache().put("events-octo/p1-n30", &json!([])).unwrap();
        service.cache().put("events-octo-cat/p1-n30", &json!([])).unwrap();
        service.cache().put("user-octo-cat", &json!({})).unwrap();

        assert_eq!(service.forget("octo").await.unwrap(), 1);
        assert!(service.cache().entry("events-octo-cat/p1-n30").is_some());
        assert!(service.cache().entry("user-octo-cat").is_some());
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let service = service(ScriptedTransport::new().respond(200, page(0, 1)));
        service.recent_events("octocat", 5).await.unwrap();
        assert!(!service.cache().is_empty());

        service.clear_cache().await.unwrap();
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_page_size_is_capped_at_api_maximum() {
        let transport = ScriptedTransport::new()
            .respond(200, page(0, 100))
            .respond(200, page(100, 100));
        let service = service(transport).with_page_size(200);

        let events = service.recent_events("octocat", 150).await.unwrap();

        assert_eq!(events.len(), 200);
        assert_eq!(
            service.client().transport().requests(),
            vec![
                "https://api.github.com/users/octocat/events/public?page=1&per_page=100"
                    .to_string(),
                "https://api.github.com/users/octocat/events/public?page=2&per_page=100"
                    .to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_zero_page_size_becomes_one() {
        let service = service(ScriptedTransport::new().respond(200, page(0, 1)))
            .with_page_size(0);
        service.recent_events("octocat", 1).await.unwrap();
        assert_eq!(
            service.client().transport().requests(),
            vec!["https://api.github.com/users/octocat/events/public?page=1&per_page=1".to_string()]
        );
    }
}
