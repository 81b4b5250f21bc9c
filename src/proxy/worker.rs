//! One proxy instance: install, activate and fetch interception
//!
//! Navigations are network-first, raced against a timeout, and fall back
//! through exact cache match, cached index page (directory-style paths)
//! and cached offline page. Static assets are stale-while-revalidate.
//!
//! Background cache writes run as detached tasks tracked in a `JoinSet`.
//! The response path never awaits them; [`InterceptionProxy::settle`] does.
//! Dropping the proxy aborts whatever is still in flight.

use crate::config::schema::ProxyConfig;
use crate::error::{PrecacheError, PrecacheResult};
use crate::proxy::lifecycle::LifecycleState;
use crate::proxy::network::Network;
use crate::proxy::request::{cache_key, Request, RequestClass, Response};
use crate::proxy::storage::CacheStorage;
use crate::version::CacheNamespace;
use futures_util::future::try_join_all;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

/// Everything one proxy instance needs, built once and passed in
#[derive(Debug, Clone)]
pub struct InterceptionConfig {
    /// Origin and base path the proxy controls
    pub scope: Url,

    /// Cache store this instance owns
    pub namespace: CacheNamespace,

    /// Scope-relative URLs fetched and stored at install
    pub manifest: Vec<String>,

    /// Scope-relative offline fallback page
    pub offline_page: String,

    /// Scope-relative page served for directory-style navigations
    pub index_page: String,

    /// Navigation race timeout; zero disables the race
    pub navigation_timeout: Duration,

    /// Take over as soon as install completes
    pub skip_waiting: bool,
}

impl InterceptionConfig {
    /// Build from a namespace and manifest using the configured proxy settings
    pub fn new(
        scope: Url,
        namespace: CacheNamespace,
        manifest: Vec<String>,
        settings: &ProxyConfig,
    ) -> Self {
        Self {
            scope,
            namespace,
            manifest,
            offline_page: settings.offline_page.clone(),
            index_page: settings.index_page.clone(),
            navigation_timeout: Duration::from_millis(settings.navigation_timeout_ms),
            skip_waiting: settings.skip_waiting,
        }
    }

    /// Resolve a scope-relative entry to an absolute URL
    pub fn resolve(&self, entry: &str) -> PrecacheResult<Url> {
        self.scope
            .join(entry)
            .map_err(|e| PrecacheError::url(entry, e))
    }

    /// Whether a request targets the proxy's own origin
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.scope.origin()
    }
}

/// Result of offering a request to the proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the page's request goes to the network untouched
    PassThrough,
    /// Answered by the proxy
    Respond(Response),
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::PassThrough => None,
            Self::Respond(response) => Some(response),
        }
    }
}

/// A single proxy instance bound to one cache namespace
pub struct InterceptionProxy {
    config: Arc<InterceptionConfig>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    state: Mutex<LifecycleState>,
    skip_waiting: AtomicBool,
    background: Mutex<JoinSet<()>>,
}

impl InterceptionProxy {
    /// Create an instance in the `Installing` state
    pub fn new(
        config: InterceptionConfig,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            network,
            state: Mutex::new(LifecycleState::Installing),
            skip_waiting: AtomicBool::new(false),
            background: Mutex::new(JoinSet::new()),
        }
    }

    pub fn config(&self) -> &InterceptionConfig {
        &self.config
    }

    pub fn namespace(&self) -> String {
        self.config.namespace.name()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, next: LifecycleState) -> PrecacheResult<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = state.transition(next)?;
        debug!("{} -> {}", self.config.namespace, next);
        Ok(())
    }

    /// Mark this instance as replaced or failed
    pub fn mark_redundant(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != LifecycleState::Redundant {
            *state = LifecycleState::Redundant;
            info!("{} is now redundant", self.config.namespace);
        }
    }

    /// Ask to leave `Waiting` without waiting for the previous instance
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn wants_skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Precache every manifest entry into this instance's namespace
    ///
    /// All entries are fetched before anything is written, then stored in
    /// one batch. A single failed or non-2xx entry fails the whole install
    /// and leaves every existing store untouched.
    pub async fn install(&self) -> PrecacheResult<usize> {
        if self.state() != LifecycleState::Installing {
            return Err(PrecacheError::Lifecycle {
                from: self.state().to_string(),
                to: LifecycleState::Waiting.to_string(),
            });
        }

        let namespace = self.namespace();
        match self.precache(&namespace).await {
            Ok(count) => {
                self.transition(LifecycleState::Waiting)?;
                if self.config.skip_waiting {
                    self.skip_waiting();
                }
                info!("Installed {} ({} entries)", namespace, count);
                Ok(count)
            }
            Err(e) => {
                self.mark_redundant();
                warn!("Install of {} failed: {}", namespace, e);
                Err(PrecacheError::InstallFailed {
                    namespace,
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn precache(&self, namespace: &str) -> PrecacheResult<usize> {
        let urls = self
            .config
            .manifest
            .iter()
            .map(|entry| self.config.resolve(entry))
            .collect::<PrecacheResult<Vec<_>>>()?;

        let fetches = urls.into_iter().map(|url| async move {
            let response = self.network.fetch(&Request::get(url.clone())).await?;
            if !response.is_ok() {
                return Err(PrecacheError::network(
                    url.as_str(),
                    format!("status {}", response.status()),
                ));
            }
            Ok((cache_key(&url), response))
        });

        let entries = try_join_all(fetches).await?;
        let count = entries.len();
        self.storage.open(namespace).await?;
        self.storage.put_batch(namespace, entries).await?;
        Ok(count)
    }

    /// Delete every other namespace's store and start serving
    ///
    /// Returns the number of stores purged.
    pub async fn activate(&self) -> PrecacheResult<usize> {
        self.transition(LifecycleState::Activating)?;

        let namespace = self.namespace();
        let mut purged = 0;
        for key in self.storage.keys().await? {
            if key != namespace && self.storage.delete(&key).await? {
                debug!("Purged stale cache {}", key);
                purged += 1;
            }
        }

        self.transition(LifecycleState::Active)?;
        info!("Activated {} (purged {} stale caches)", namespace, purged);
        Ok(purged)
    }

    /// Offer an intercepted request to the proxy
    ///
    /// Only an active instance intercepts, and only same-origin GET
    /// requests. Network failures are absorbed by the fallback chain;
    /// nothing here returns an error.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        if !self.state().is_serving() {
            debug!("{} is {}; not intercepting", self.config.namespace, self.state());
            return FetchOutcome::PassThrough;
        }
        if request.method() != "GET" || !self.config.is_same_origin(request.url()) {
            return FetchOutcome::PassThrough;
        }

        let response = match request.class() {
            RequestClass::Navigation => self.network_first(request).await,
            RequestClass::StaticAsset => self.stale_while_revalidate(request).await,
        };
        FetchOutcome::Respond(response)
    }

    async fn network_first(&self, request: &Request) -> Response {
        let timeout = self.config.navigation_timeout;
        let fetched = if timeout.is_zero() {
            self.network.fetch(request).await
        } else {
            match tokio::time::timeout(timeout, self.network.fetch(request)).await {
                Ok(result) => result,
                Err(_) => Err(PrecacheError::network(
                    request.url().as_str(),
                    format!("timed out after {}ms", timeout.as_millis()),
                )),
            }
        };

        match fetched {
            Ok(response) => {
                self.write_through(request.cache_key(), response.clone());
                response
            }
            Err(e) => {
                debug!("Navigation fell back to cache: {}", e);
                self.navigation_fallback(request).await
            }
        }
    }

    async fn navigation_fallback(&self, request: &Request) -> Response {
        if let Some(hit) = self.lookup(&request.cache_key()).await {
            return hit;
        }

        if request.url().path().ends_with('/') {
            if let Some(index) = self.lookup_page(&self.config.index_page).await {
                return index;
            }
        }

        if let Some(offline) = self.lookup_page(&self.config.offline_page).await {
            return offline;
        }

        warn!(
            "No cached fallback for {}; offline page missing from cache",
            request.url()
        );
        Response::gateway_timeout()
    }

    async fn stale_while_revalidate(&self, request: &Request) -> Response {
        let key = request.cache_key();
        let cached = self.lookup(&key).await;

        let storage = Arc::clone(&self.storage);
        let network = Arc::clone(&self.network);
        let namespace = self.namespace();
        let request = request.clone();
        let revalidate = async move {
            match network.fetch(&request).await {
                Ok(response) => {
                    if response.is_ok() {
                        if let Err(e) = storage.put(&namespace, &key, response.clone()).await {
                            warn!("Revalidation write for {} failed: {}", key, e);
                        }
                    }
                    Some(response)
                }
                Err(e) => {
                    debug!("Revalidation fetch failed: {}", e);
                    None
                }
            }
        };

        match cached {
            Some(hit) => {
                self.keep_alive(async move {
                    revalidate.await;
                });
                hit
            }
            None => revalidate.await.unwrap_or_else(Response::gateway_timeout),
        }
    }

    /// Best-effort write of a network response into the current store
    fn write_through(&self, key: String, response: Response) {
        let storage = Arc::clone(&self.storage);
        let namespace = self.namespace();
        self.keep_alive(async move {
            if let Err(e) = storage.put(&namespace, &key, response).await {
                warn!("Write-through for {} failed: {}", key, e);
            }
        });
    }

    async fn lookup(&self, key: &str) -> Option<Response> {
        match self.storage.match_any(key).await {
            Ok(hit) => hit,
            Err(e) if e.is_soft() => {
                debug!("Cache lookup for {} missed: {}", key, e);
                None
            }
            Err(e) => {
                warn!("Cache lookup for {} failed: {}", key, e);
                None
            }
        }
    }

    async fn lookup_page(&self, page: &str) -> Option<Response> {
        let url = self.config.resolve(page).ok()?;
        self.lookup(&cache_key(&url)).await
    }

    /// Detach a task whose completion is tracked but not awaited
    fn keep_alive<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while set.try_join_next().is_some() {}
        set.spawn(task);
    }

    /// Wait for every detached background task to finish
    pub async fn settle(&self) {
        loop {
            let mut set = std::mem::take(
                &mut *self
                    .background
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            );
            if set.is_empty() {
                break;
            }
            while let Some(result) = set.join_next().await {
                if let Err(e) = result {
                    warn!("Background cache task failed: {}", e);
                }
            }
        }
    }
}

impl std::fmt::Debug for InterceptionProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptionProxy")
            .field("namespace", &self.config.namespace)
            .field("state", &self.state())
            .finish()
    }
}
