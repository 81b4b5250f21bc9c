//! Precache - offline-first cache proxy tooling
//!
//! Models a static site's cache proxy (versioned precache, stale namespace
//! purge, network-first navigations, stale-while-revalidate assets) and
//! ships the release tools around it: a version bump, a consistency gate
//! and a build-output proxy generator.

pub mod bump;
pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod proxy;
pub mod site;
pub mod ui;
pub mod validate;
pub mod version;

pub use error::{PrecacheError, PrecacheResult};
