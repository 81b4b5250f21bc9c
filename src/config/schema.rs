//! Configuration schema for precache
//!
//! Configuration is read from `precache.toml` at the site root. Every table
//! is optional; missing keys fall back to the defaults below.

use crate::version::TrackedAsset;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Site layout and release files
    pub site: SiteConfig,

    /// Asset references that carry the shared version tag
    pub assets: Vec<TrackedAsset>,

    /// Runtime proxy behaviour
    pub proxy: ProxyConfig,

    /// Build-output proxy generation
    pub dist: DistConfig,

    /// Release gate settings
    pub validate: ValidateConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            site: SiteConfig::default(),
            assets: TrackedAsset::default_set(),
            proxy: ProxyConfig::default(),
            dist: DistConfig::default(),
            validate: ValidateConfig::default(),
        }
    }
}

impl Config {
    /// Cache prefix for the generated build-output proxy
    pub fn dist_prefix(&self) -> String {
        self.dist
            .cache_prefix
            .clone()
            .unwrap_or_else(|| format!("{}-dist", self.site.cache_prefix))
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Site layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Prefix of the proxy's cache namespace (`<prefix>-<tag>`)
    pub cache_prefix: String,

    /// Hand-authored proxy source, relative to the site root
    pub proxy_source: String,

    /// Status document whose version marker is kept in step (optional file)
    pub status_doc: String,

    /// Label preceding the version marker in the status document
    pub status_marker: String,

    /// Files that must exist in the site root before release
    pub required_files: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            cache_prefix: "site".to_string(),
            proxy_source: "sw.js".to_string(),
            status_doc: "Task_Status.md".to_string(),
            status_marker: "Cache-busting version".to_string(),
            required_files: vec!["robots.txt".to_string(), "sitemap.xml".to_string()],
        }
    }
}

/// Runtime proxy behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Page served when a navigation can be answered neither by network nor cache
    pub offline_page: String,

    /// Page served for directory-style navigations when offline
    pub index_page: String,

    /// Navigation network race timeout in milliseconds (0 disables the race)
    pub navigation_timeout_ms: u64,

    /// Take over from the previous proxy as soon as install completes
    pub skip_waiting: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            offline_page: "offline.html".to_string(),
            index_page: "index.html".to_string(),
            navigation_timeout_ms: 4500,
            skip_waiting: true,
        }
    }
}

/// Build-output proxy generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistConfig {
    /// Build output directory, relative to the site root
    pub out_dir: String,

    /// Cache prefix for the generated proxy (default: `<site.cache_prefix>-dist`)
    pub cache_prefix: Option<String>,

    /// Pre-compressed sibling extensions left out of the manifest
    pub excluded_extensions: Vec<String>,

    /// OS metadata file names left out of the manifest
    pub excluded_names: Vec<String>,
}

impl Default for DistConfig {
    fn default() -> Self {
        Self {
            out_dir: "dist".to_string(),
            cache_prefix: None,
            excluded_extensions: vec!["br".to_string(), "gz".to_string()],
            excluded_names: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                "desktop.ini".to_string(),
            ],
        }
    }
}

/// Release gate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateConfig {
    /// Script modules the proxy manifest must list with the canonical tag
    pub required_modules: Vec<String>,

    /// Run the site hygiene checks (manifest links, sitemap, robots, references)
    pub site_checks: bool,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            required_modules: vec![
                "scripts/main.js".to_string(),
                "scripts/core.js".to_string(),
                "scripts/motion.js".to_string(),
            ],
            site_checks: true,
        }
    }
}
