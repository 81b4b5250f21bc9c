//! Build-output proxy generation
//!
//! Bundled build output carries content-hashed file names, so the
//! hand-authored proxy's `?v=` precache list cannot be reused. Instead the
//! output tree is scanned and a proxy with the same strategies is rendered
//! into it, namespaced by the version token recovered from the source
//! proxy (or a timestamp when none can be found).

pub mod render;
pub mod scan;
pub mod source;

pub use render::{render_proxy, RenderParams};
pub use scan::{scan_build_output, ScanFilter};
pub use source::ProxySource;

use crate::config::Config;
use crate::error::{PrecacheError, PrecacheResult};
use crate::site::{self, write_atomic};
use crate::version::CacheNamespace;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the generated proxy inside the output root
pub const PROXY_FILE_NAME: &str = "sw.js";

/// Inputs for one generation run
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Build output root
    pub out_dir: PathBuf,

    /// Hand-authored proxy the version token is read from
    pub source_proxy: PathBuf,

    /// Cache prefix used by the hand-authored proxy
    pub source_prefix: String,

    /// Cache prefix for the generated proxy
    pub cache_prefix: String,

    pub offline_page: String,
    pub index_page: String,
    pub navigation_timeout_ms: u64,

    pub excluded_extensions: Vec<String>,
    pub excluded_names: Vec<String>,
}

impl GenerateOptions {
    /// Options for a site root, taken from configuration
    pub fn from_config(root: &Path, config: &Config) -> Self {
        Self {
            out_dir: root.join(&config.dist.out_dir),
            source_proxy: root.join(&config.site.proxy_source),
            source_prefix: config.site.cache_prefix.clone(),
            cache_prefix: config.dist_prefix(),
            offline_page: config.proxy.offline_page.clone(),
            index_page: config.proxy.index_page.clone(),
            navigation_timeout_ms: config.proxy.navigation_timeout_ms,
            excluded_extensions: config.dist.excluded_extensions.clone(),
            excluded_names: config.dist.excluded_names.clone(),
        }
    }

    fn filter(&self) -> ScanFilter {
        ScanFilter {
            excluded_extensions: self.excluded_extensions.clone(),
            excluded_names: self.excluded_names.clone(),
            excluded_paths: vec![
                PROXY_FILE_NAME.to_string(),
                format!("{}{}", PROXY_FILE_NAME, site::TEMP_SUFFIX),
            ],
        }
    }
}

/// Result of a generation run
#[derive(Debug, Clone)]
pub struct GeneratedProxy {
    /// Path of the written proxy
    pub path: PathBuf,

    pub namespace: CacheNamespace,

    /// Sorted precache manifest
    pub precache: Vec<String>,

    /// Short SHA-256 of the manifest, for telling deploys apart
    pub digest: String,
}

impl GeneratedProxy {
    pub fn precache_count(&self) -> usize {
        self.precache.len()
    }
}

/// Scan the build output and write a proxy into it
///
/// Fails before writing anything when the output root is missing or does
/// not contain the offline page.
pub async fn generate_dist_proxy(options: &GenerateOptions) -> PrecacheResult<GeneratedProxy> {
    let is_dir = tokio::fs::metadata(&options.out_dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(PrecacheError::BuildOutputMissing(options.out_dir.clone()));
    }

    let namespace = match source_token(options).await {
        Some(token) => CacheNamespace::from_token(&options.cache_prefix, &token),
        None => {
            let now = Utc::now().timestamp_millis();
            warn!(
                "No version token in {}; falling back to timestamp {}",
                options.source_proxy.display(),
                now
            );
            CacheNamespace::timestamped(&options.cache_prefix, now)
        }
    };

    let root = options.out_dir.clone();
    let filter = options.filter();
    let precache = tokio::task::spawn_blocking(move || scan_build_output(&root, &filter))
        .await
        .map_err(|e| PrecacheError::Internal(format!("scan task failed: {}", e)))??;
    debug!("Scanned {} build artifacts", precache.len());

    if !precache.iter().any(|p| p == &options.offline_page) {
        return Err(PrecacheError::OfflinePageMissing {
            dir: options.out_dir.clone(),
            page: options.offline_page.clone(),
        });
    }

    let text = render_proxy(&RenderParams {
        cache_name: &namespace.name(),
        precache_urls: &precache,
        offline_page: &options.offline_page,
        index_page: &options.index_page,
        navigation_timeout_ms: options.navigation_timeout_ms,
        generated_at: Utc::now(),
    })?;

    let path = options.out_dir.join(PROXY_FILE_NAME);
    write_atomic(&path, &text).await?;

    let digest = manifest_digest(&precache);
    info!(
        "Generated {} ({}, {} entries, manifest {})",
        path.display(),
        namespace,
        precache.len(),
        digest
    );

    Ok(GeneratedProxy {
        path,
        namespace,
        precache,
        digest,
    })
}

async fn source_token(options: &GenerateOptions) -> Option<String> {
    match ProxySource::load(&options.source_proxy).await {
        Ok(source) => source.token(&options.source_prefix).map(str::to_string),
        Err(e) => {
            debug!("Source proxy unreadable: {}", e);
            None
        }
    }
}

/// First 12 hex chars of the SHA-256 over the newline-joined manifest
pub fn manifest_digest(precache: &[String]) -> String {
    let mut hasher = Sha256::new();
    for entry in precache {
        hasher.update(entry.as_bytes());
        hasher.update(b"\n");
    }
    let result = hasher.finalize();
    hex::encode(&result[..6])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(with_offline: bool) -> (TempDir, GenerateOptions) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(
            root.join("sw.js"),
            "const CACHE_NAME = 'shop-20260113.2';\nconst PRECACHE_URLS = [];\n",
        )
        .unwrap();

        let dist = root.join("dist");
        fs::create_dir_all(dist.join("assets")).unwrap();
        fs::write(dist.join("index.html"), "<html>").unwrap();
        fs::write(dist.join("assets/index-1a2b.js"), "js").unwrap();
        fs::write(dist.join("assets/index-1a2b.js.br"), "br").unwrap();
        if with_offline {
            fs::write(dist.join("offline.html"), "<html>").unwrap();
        }

        let mut config = Config::default();
        config.site.cache_prefix = "shop".to_string();
        let options = GenerateOptions::from_config(root, &config);
        (tmp, options)
    }

    #[tokio::test]
    async fn generates_proxy_with_source_token() {
        let (_tmp, options) = fixture(true);
        let generated = generate_dist_proxy(&options).await.unwrap();

        assert_eq!(generated.namespace.name(), "shop-dist-20260113.2");
        assert_eq!(
            generated.precache,
            vec!["assets/index-1a2b.js", "index.html", "offline.html"]
        );
        assert_eq!(generated.digest.len(), 12);

        let written = fs::read_to_string(&generated.path).unwrap();
        let parsed = ProxySource::parse(&written);
        assert_eq!(parsed.cache_name.as_deref(), Some("shop-dist-20260113.2"));
        assert_eq!(parsed.precache_urls, generated.precache);
    }

    #[tokio::test]
    async fn regenerating_does_not_list_itself() {
        let (_tmp, options) = fixture(true);
        let first = generate_dist_proxy(&options).await.unwrap();
        let second = generate_dist_proxy(&options).await.unwrap();
        assert_eq!(first.precache, second.precache);
        assert_eq!(first.digest, second.digest);
    }

    #[tokio::test]
    async fn missing_offline_page_writes_nothing() {
        let (_tmp, options) = fixture(false);
        let err = generate_dist_proxy(&options).await.unwrap_err();

        assert!(matches!(err, PrecacheError::OfflinePageMissing { .. }));
        assert!(!options.out_dir.join(PROXY_FILE_NAME).exists());
        assert!(!options.out_dir.join("sw.js.tmp").exists());
    }

    #[tokio::test]
    async fn missing_output_dir() {
        let (_tmp, mut options) = fixture(true);
        options.out_dir = options.out_dir.join("nope");
        let err = generate_dist_proxy(&options).await.unwrap_err();
        assert!(matches!(err, PrecacheError::BuildOutputMissing(_)));
    }

    #[tokio::test]
    async fn falls_back_to_timestamp_without_source() {
        let (_tmp, options) = fixture(true);
        fs::remove_file(&options.source_proxy).unwrap();

        let generated = generate_dist_proxy(&options).await.unwrap();
        let token = generated.namespace.token();
        assert!(token.parse::<i64>().unwrap() > 1_600_000_000_000);
        assert_eq!(generated.namespace.prefix(), "shop-dist");
    }

    #[test]
    fn digest_depends_on_entries() {
        let a = manifest_digest(&["a.js".to_string()]);
        let b = manifest_digest(&["b.js".to_string()]);
        assert_ne!(a, b);
        assert_eq!(a, manifest_digest(&["a.js".to_string()]));
    }
}
