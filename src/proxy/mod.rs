//! Offline-first interception proxy
//!
//! Models the browser-side cache proxy that the site ships: a versioned
//! precache installed into its own namespace, purge of stale namespaces on
//! activation, and per-request strategies:
//!
//! - navigations: network first, raced against a timeout, falling back to
//!   cached page, cached index (directory paths), cached offline page
//! - static assets: stale-while-revalidate
//!
//! Storage and network sit behind traits so the same strategies run
//! against an in-process cache and either a real HTTP client or a
//! scripted network.

pub mod lifecycle;
pub mod network;
pub mod registration;
pub mod request;
pub mod storage;
pub mod worker;

pub use lifecycle::{ControlMessage, LifecycleState};
pub use network::{HttpNetwork, Network, OfflineNetwork, ToggleNetwork};
pub use registration::Registration;
pub use request::{Request, RequestClass, RequestMode, Response};
pub use storage::{CacheStorage, MemoryCacheStorage};
pub use worker::{FetchOutcome, InterceptionConfig, InterceptionProxy};
