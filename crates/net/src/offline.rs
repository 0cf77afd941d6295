//! Offline client: response caching strategies and background sync
//!
//! API calls go network-first and fall back to the cache, static assets
//! are served cache-first, and every other page is served
//! stale-while-revalidate. Visitor events recorded while offline wait in
//! per-store queues until [`OfflineClient::sync`] delivers them.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use ksyk_core::models::{CachedResponse, SyncStore};
use ksyk_core::Database;

use crate::error::{Error, Result};
use crate::protocol;

pub const STATIC_CACHE: &str = "ksyk-static-v1";
pub const DYNAMIC_CACHE: &str = "ksyk-dynamic-v1";
pub const API_CACHE: &str = "ksyk-api-v1";

/// Caches kept by the current client version
pub const CACHE_NAMES: [&str; 3] = [STATIC_CACHE, DYNAMIC_CACHE, API_CACHE];

/// Name of the offline database (stored as `ksyk-offline.db`)
pub const OFFLINE_DB_NAME: &str = "ksyk-offline";

const STATIC_EXTENSIONS: &[&str] = &[
    "js", "css", "png", "jpg", "jpeg", "svg", "ico", "woff", "woff2", "json",
];

/// How a request is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
    StaleWhileRevalidate,
}

/// Path component of a relative or absolute URL, without query or fragment
fn path_of(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(scheme_end) => {
            let after = &url[scheme_end + 3..];
            after.find('/').map_or("/", |slash| &after[slash..])
        }
        None => url,
    };
    rest.split(['?', '#']).next().unwrap_or(rest)
}

/// Pick the caching strategy for `url`
pub fn strategy_for(url: &str) -> Strategy {
    let path = path_of(url);
    if path == protocol::API_PREFIX || path.starts_with("/api/") {
        return Strategy::NetworkFirst;
    }
    let file = path.rsplit('/').next().unwrap_or(path);
    let is_static = file
        .rsplit_once('.')
        .map(|(_, ext)| STATIC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if is_static {
        Strategy::CacheFirst
    } else {
        Strategy::StaleWhileRevalidate
    }
}

/// Raw response as seen by the offline layer
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    fn into_cached(self, cache_name: &str, url: &str) -> CachedResponse {
        CachedResponse {
            cache_name: cache_name.to_string(),
            url: url.to_string(),
            status: self.status,
            content_type: self.content_type,
            body: self.body,
            stored_at: Utc::now(),
        }
    }
}

impl From<CachedResponse> for FetchedResponse {
    fn from(cached: CachedResponse) -> Self {
        Self {
            status: cached.status,
            content_type: cached.content_type,
            body: cached.body,
        }
    }
}

/// Network access used by the offline client
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// GET `url`; `Err` means the network could not be reached
    async fn fetch(&self, url: &str) -> Result<FetchedResponse>;

    /// POST a JSON body; any non-2xx answer is an error
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<()>;
}

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Network,
    Cache,
}

/// Answer to [`OfflineClient::fetch`]
#[derive(Debug)]
pub struct FetchOutcome {
    pub response: FetchedResponse,
    pub source: Source,
    /// Background refresh started for a stale-while-revalidate cache hit
    pub revalidation: Option<JoinHandle<()>>,
}

impl FetchOutcome {
    fn network(response: FetchedResponse) -> Self {
        Self {
            response,
            source: Source::Network,
            revalidation: None,
        }
    }

    fn cache(response: CachedResponse) -> Self {
        Self {
            response: response.into(),
            source: Source::Cache,
            revalidation: None,
        }
    }
}

/// Result of one background sync run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub sent: usize,
    pub failed: usize,
}

fn lock(db: &Mutex<Database>) -> Result<std::sync::MutexGuard<'_, Database>> {
    db.lock()
        .map_err(|_| Error::Internal("Offline database lock poisoned".into()))
}

/// Fetch `url` and store successful answers in `cache_name`
async fn fetch_and_store<F: Fetcher>(
    fetcher: &F,
    db: &Mutex<Database>,
    url: &str,
    cache_name: &str,
) -> Result<FetchedResponse> {
    let response = fetcher.fetch(url).await?;
    if response.is_success() {
        let cached = response.clone().into_cached(cache_name, url);
        lock(db)?.offline().put_response(&cached)?;
    }
    Ok(response)
}

pub struct OfflineClient<F> {
    fetcher: Arc<F>,
    db: Arc<Mutex<Database>>,
}

impl<F> Clone for OfflineClient<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            db: self.db.clone(),
        }
    }
}

impl<F: Fetcher> OfflineClient<F> {
    pub fn new(fetcher: F, db: Database) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open (or create) `ksyk-offline.db` inside `dir`
    pub fn open(fetcher: F, dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let db = Database::open(dir.join(format!("{}.db", OFFLINE_DB_NAME)))?;
        Ok(Self::new(fetcher, db))
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch `urls` into the static cache; the first failure aborts
    #[instrument(skip(self, urls))]
    pub async fn precache(&self, urls: &[&str]) -> Result<usize> {
        for url in urls {
            let response =
                fetch_and_store(self.fetcher.as_ref(), &self.db, url, STATIC_CACHE).await?;
            if !response.is_success() {
                return Err(Error::Status {
                    status: response.status,
                    message: format!("Precaching {} failed", url),
                });
            }
        }
        info!(count = urls.len(), "Precached static assets");
        Ok(urls.len())
    }

    /// Delete caches left behind by older client versions
    pub fn activate(&self) -> Result<u64> {
        let removed = lock(&self.db)?.offline().retain_caches(&CACHE_NAMES)?;
        if removed > 0 {
            info!(removed, "Removed stale cache entries");
        }
        Ok(removed)
    }

    /// Answer a GET with the strategy [`strategy_for`] picks
    pub async fn fetch(&self, url: &str) -> Result<FetchOutcome> {
        match strategy_for(url) {
            Strategy::NetworkFirst => self.network_first(url).await,
            Strategy::CacheFirst => self.cache_first(url).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(url).await,
        }
    }

    async fn network_first(&self, url: &str) -> Result<FetchOutcome> {
        match fetch_and_store(self.fetcher.as_ref(), &self.db, url, API_CACHE).await {
            Ok(response) => Ok(FetchOutcome::network(response)),
            Err(e) => {
                debug!(url, error = %e, "Network failed, trying cache");
                let cached = lock(&self.db)?.offline().match_any(url)?;
                cached
                    .map(FetchOutcome::cache)
                    .ok_or_else(|| Error::Offline(url.to_string()))
            }
        }
    }

    async fn cache_first(&self, url: &str) -> Result<FetchOutcome> {
        let cached = lock(&self.db)?.offline().match_any(url)?;
        if let Some(hit) = cached {
            return Ok(FetchOutcome::cache(hit));
        }
        let response = fetch_and_store(self.fetcher.as_ref(), &self.db, url, STATIC_CACHE)
            .await
            .map_err(|_| Error::Offline(url.to_string()))?;
        Ok(FetchOutcome::network(response))
    }

    async fn stale_while_revalidate(&self, url: &str) -> Result<FetchOutcome> {
        let cached = lock(&self.db)?.offline().match_any(url)?;
        match cached {
            Some(hit) => {
                let fetcher = self.fetcher.clone();
                let db = self.db.clone();
                let owned_url = url.to_string();
                let handle = tokio::spawn(async move {
                    if let Err(e) =
                        fetch_and_store(fetcher.as_ref(), &db, &owned_url, DYNAMIC_CACHE).await
                    {
                        debug!(url = %owned_url, error = %e, "Revalidation failed");
                    }
                });
                Ok(FetchOutcome {
                    revalidation: Some(handle),
                    ..FetchOutcome::cache(hit)
                })
            }
            None => {
                let response = fetch_and_store(self.fetcher.as_ref(), &self.db, url, DYNAMIC_CACHE)
                    .await
                    .map_err(|_| Error::Offline(url.to_string()))?;
                Ok(FetchOutcome::network(response))
            }
        }
    }

    /// Park a visitor event until the next sync run
    pub fn queue(&self, store: SyncStore, payload: &serde_json::Value) -> Result<i64> {
        Ok(lock(&self.db)?.offline().enqueue(store, payload)?)
    }

    pub fn queue_search(&self, query: &str) -> Result<i64> {
        self.queue(
            SyncStore::Searches,
            &serde_json::json!({ "query": query, "at": Utc::now() }),
        )
    }

    pub fn queue_navigation(&self, from: Option<&str>, to: &str) -> Result<i64> {
        self.queue(
            SyncStore::Navigation,
            &serde_json::json!({ "from": from, "to": to, "at": Utc::now() }),
        )
    }

    pub fn pending(&self) -> Result<u64> {
        Ok(lock(&self.db)?.offline().queue_len()?)
    }

    /// Send every queued event once. Delivered events leave the queue,
    /// failed ones stay for the next run.
    #[instrument(skip(self))]
    pub async fn sync(&self) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        for store in SyncStore::ALL {
            let items = lock(&self.db)?.offline().queued(store)?;
            let url = protocol::analytics_path(store);
            for item in items {
                match self.fetcher.post_json(&url, &item.payload).await {
                    Ok(()) => {
                        lock(&self.db)?.offline().remove_queued(item.id)?;
                        report.sent += 1;
                    }
                    Err(e) => {
                        warn!(
                            store = %store,
                            id = item.id,
                            error = %e,
                            "Sync failed, keeping event"
                        );
                        report.failed += 1;
                    }
                }
            }
        }
        info!(sent = report.sent, failed = report.failed, "Background sync finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-memory network that can be switched off
    #[derive(Default)]
    struct FakeNetwork {
        online: AtomicBool,
        pages: Mutex<HashMap<String, String>>,
        posted: Mutex<Vec<(String, serde_json::Value)>>,
        reject_posts: AtomicBool,
    }

    impl FakeNetwork {
        fn online() -> Self {
            let network = Self::default();
            network.online.store(true, Ordering::SeqCst);
            network
        }

        fn serve(&self, url: &str, body: &str) {
            self.pages
                .lock()
                .unwrap()
                .insert(url.to_string(), body.to_string());
        }

        fn set_online(&self, online: bool) {
            self.online.store(online, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Fetcher for FakeNetwork {
        async fn fetch(&self, url: &str) -> Result<FetchedResponse> {
            if !self.online.load(Ordering::SeqCst) {
                return Err(Error::Offline(url.to_string()));
            }
            let page = self.pages.lock().unwrap().get(url).cloned();
            Ok(match page {
                Some(body) => FetchedResponse {
                    status: 200,
                    content_type: Some("text/plain".to_string()),
                    body: body.into_bytes(),
                },
                None => FetchedResponse {
                    status: 404,
                    content_type: None,
                    body: Vec::new(),
                },
            })
        }

        async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<()> {
            if !self.online.load(Ordering::SeqCst) || self.reject_posts.load(Ordering::SeqCst) {
                return Err(Error::Offline(url.to_string()));
            }
            self.posted
                .lock()
                .unwrap()
                .push((url.to_string(), body.clone()));
            Ok(())
        }
    }

    fn client(network: FakeNetwork) -> OfflineClient<FakeNetwork> {
        OfflineClient::new(network, Database::open_in_memory().unwrap())
    }

    fn body(outcome: &FetchOutcome) -> &str {
        std::str::from_utf8(&outcome.response.body).unwrap()
    }

    #[test]
    fn test_strategy_by_route() {
        assert_eq!(strategy_for("/api/rooms"), Strategy::NetworkFirst);
        assert_eq!(strategy_for("/api/search?q=gym"), Strategy::NetworkFirst);
        assert_eq!(
            strategy_for("https://map.ksyk.fi/api/buildings"),
            Strategy::NetworkFirst
        );
        assert_eq!(strategy_for("/assets/app.js"), Strategy::CacheFirst);
        assert_eq!(strategy_for("/logo.PNG"), Strategy::CacheFirst);
        assert_eq!(strategy_for("/manifest.json?v=2"), Strategy::CacheFirst);
        assert_eq!(strategy_for("/fonts/inter.woff2"), Strategy::CacheFirst);
        assert_eq!(strategy_for("/"), Strategy::StaleWhileRevalidate);
        assert_eq!(strategy_for("/admin/map-builder"), Strategy::StaleWhileRevalidate);
        assert_eq!(strategy_for("https://map.ksyk.fi"), Strategy::StaleWhileRevalidate);
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cache() {
        let network = FakeNetwork::online();
        network.serve("/api/rooms", "[1]");
        let client = client(network);

        let first = client.fetch("/api/rooms").await.unwrap();
        assert_eq!(first.source, Source::Network);

        client.fetcher().serve("/api/rooms", "[1,2]");
        let second = client.fetch("/api/rooms").await.unwrap();
        assert_eq!(body(&second), "[1,2]");

        client.fetcher().set_online(false);
        let offline = client.fetch("/api/rooms").await.unwrap();
        assert_eq!(offline.source, Source::Cache);
        assert_eq!(body(&offline), "[1,2]");

        assert!(matches!(
            client.fetch("/api/staff").await,
            Err(Error::Offline(_))
        ));
    }

    #[tokio::test]
    async fn test_network_first_does_not_cache_errors() {
        let client = client(FakeNetwork::online());
        let missing = client.fetch("/api/nothing").await.unwrap();
        assert_eq!(missing.response.status, 404);

        client.fetcher().set_online(false);
        assert!(client.fetch("/api/nothing").await.is_err());
    }

    #[tokio::test]
    async fn test_cache_first_skips_network_once_cached() {
        let network = FakeNetwork::online();
        network.serve("/app.js", "v1");
        let client = client(network);
        client.precache(&["/app.js"]).await.unwrap();

        client.fetcher().serve("/app.js", "v2");
        let hit = client.fetch("/app.js").await.unwrap();
        assert_eq!(hit.source, Source::Cache);
        assert_eq!(body(&hit), "v1");
    }

    #[tokio::test]
    async fn test_precache_failure_aborts() {
        let client = client(FakeNetwork::online());
        assert!(client.precache(&["/missing.css"]).await.is_err());
    }

    #[tokio::test]
    async fn test_stale_while_revalidate_refreshes_in_background() {
        let network = FakeNetwork::online();
        network.serve("/", "old");
        let client = client(network);

        let first = client.fetch("/").await.unwrap();
        assert_eq!(first.source, Source::Network);
        assert!(first.revalidation.is_none());

        client.fetcher().serve("/", "new");
        let stale = client.fetch("/").await.unwrap();
        assert_eq!(stale.source, Source::Cache);
        assert_eq!(body(&stale), "old");
        stale.revalidation.unwrap().await.unwrap();

        client.fetcher().set_online(false);
        let fresh = client.fetch("/").await.unwrap();
        assert_eq!(body(&fresh), "new");
        fresh.revalidation.unwrap().await.unwrap();
    }

    #[tokio::test]
    async fn test_sync_sends_once_and_keeps_failures() {
        let client = client(FakeNetwork::online());
        client.queue_search("kirjasto").unwrap();
        client.queue_navigation(Some("M101"), "M210").unwrap();

        client.fetcher().reject_posts.store(true, Ordering::SeqCst);
        let report = client.sync().await.unwrap();
        assert_eq!(report, SyncReport { sent: 0, failed: 2 });
        assert_eq!(client.pending().unwrap(), 2);

        client.fetcher().reject_posts.store(false, Ordering::SeqCst);
        let report = client.sync().await.unwrap();
        assert_eq!(report, SyncReport { sent: 2, failed: 0 });
        assert_eq!(client.pending().unwrap(), 0);

        let posted = client.fetcher().posted.lock().unwrap();
        assert_eq!(posted.len(), 2);
        assert_eq!(posted[0].0, "/api/analytics/searches");
        assert_eq!(posted[0].1["query"], "kirjasto");
        assert_eq!(posted[1].0, "/api/analytics/navigation");
    }

    #[tokio::test]
    async fn test_activate_drops_old_caches() {
        let client = client(FakeNetwork::online());
        {
            let db = client.db.lock().unwrap();
            db.offline()
                .put_response(
                    &FetchedResponse {
                        status: 200,
                        content_type: None,
                        body: b"old".to_vec(),
                    }
                    .into_cached("ksyk-static-v0", "/app.js"),
                )
                .unwrap();
        }
        assert_eq!(client.activate().unwrap(), 1);
    }

    #[test]
    fn test_open_creates_offline_db() {
        let dir = tempfile::tempdir().unwrap();
        let client = OfflineClient::open(FakeNetwork::online(), dir.path()).unwrap();
        client.queue_search("sali").unwrap();
        assert!(dir.path().join("ksyk-offline.db").exists());
    }
}
