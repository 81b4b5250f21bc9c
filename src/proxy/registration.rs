//! Registration of proxy versions against one origin
//!
//! At most one instance controls pages at a time. A newly registered
//! version installs into its own namespace while the current controller
//! keeps serving; it takes over when it asks to skip waiting, when the old
//! version's pages are released, or immediately if nothing is active yet.

use crate::error::PrecacheResult;
use crate::proxy::lifecycle::{ControlMessage, LifecycleState};
use crate::proxy::network::Network;
use crate::proxy::request::Request;
use crate::proxy::storage::CacheStorage;
use crate::proxy::worker::{FetchOutcome, InterceptionConfig, InterceptionProxy};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Default)]
struct Slots {
    active: Option<Arc<InterceptionProxy>>,
    waiting: Option<Arc<InterceptionProxy>>,
}

/// Tracks the controlling and waiting proxy instances for one scope
pub struct Registration {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    slots: Mutex<Slots>,
}

impl Registration {
    pub fn new(storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self {
            storage,
            network,
            slots: Mutex::new(Slots::default()),
        }
    }

    /// Install a new proxy version
    ///
    /// A failed install leaves the current controller and its store
    /// untouched. Returns the new instance's state after registration.
    pub async fn register(&self, config: InterceptionConfig) -> PrecacheResult<LifecycleState> {
        let proxy = Arc::new(InterceptionProxy::new(
            config,
            Arc::clone(&self.storage),
            Arc::clone(&self.network),
        ));
        proxy.install().await?;

        let mut slots = self.slots.lock().await;
        if let Some(previous) = slots.waiting.replace(Arc::clone(&proxy)) {
            previous.mark_redundant();
        }

        if proxy.wants_skip_waiting() || slots.active.is_none() {
            Self::promote(&mut slots).await?;
        } else {
            info!("{} installed and waiting", proxy.namespace());
        }
        Ok(proxy.state())
    }

    /// Deliver a message posted by a page
    ///
    /// Returns whether the message was recognised.
    pub async fn post_message(&self, raw: &str) -> PrecacheResult<bool> {
        match ControlMessage::parse(raw) {
            Some(ControlMessage::SkipWaiting) => {
                let mut slots = self.slots.lock().await;
                if let Some(waiting) = slots.waiting.as_ref() {
                    waiting.skip_waiting();
                }
                Self::promote(&mut slots).await?;
                Ok(true)
            }
            None => {
                debug!("Ignoring unrecognised message: {}", raw);
                Ok(false)
            }
        }
    }

    /// Every page controlled by the old version has closed
    pub async fn clients_released(&self) -> PrecacheResult<()> {
        let mut slots = self.slots.lock().await;
        Self::promote(&mut slots).await
    }

    async fn promote(slots: &mut Slots) -> PrecacheResult<()> {
        let Some(next) = slots.waiting.take() else {
            return Ok(());
        };
        next.activate().await?;
        if let Some(previous) = slots.active.replace(Arc::clone(&next)) {
            previous.mark_redundant();
        }
        info!("{} now controls the scope", next.namespace());
        Ok(())
    }

    /// Route a page request through the controlling instance
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        let controller = self.slots.lock().await.active.clone();
        match controller {
            Some(proxy) => proxy.handle_fetch(request).await,
            None => FetchOutcome::PassThrough,
        }
    }

    /// The instance currently answering fetches
    pub async fn controller(&self) -> Option<Arc<InterceptionProxy>> {
        self.slots.lock().await.active.clone()
    }

    /// State of the installed-but-waiting instance, if any
    pub async fn waiting_state(&self) -> Option<LifecycleState> {
        self.slots.lock().await.waiting.as_ref().map(|p| p.state())
    }

    /// Wait for the controller's background cache writes
    pub async fn settle(&self) {
        if let Some(proxy) = self.controller().await {
            proxy.settle().await;
        }
    }
}
