//! Reading facts out of a proxy source file
//!
//! Proxy sources declare their cache name and precache list as top-level
//! constants. Both are recovered by pattern match so the hand-authored
//! proxy and the generated one can be read the same way.

use crate::error::{PrecacheError, PrecacheResult};
use crate::version::CacheNamespace;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static CACHE_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"const\s+CACHE_NAME\s*=\s*['"]([^'"]+)['"]"#).expect("Invalid cache name regex")
});

static PRECACHE_LIST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)const\s+PRECACHE_URLS\s*=\s*\[(.*?)\]").expect("Invalid precache list regex")
});

static STRING_LITERAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'([^']*)'|"([^"]*)""#).expect("Invalid string literal regex")
});

/// Facts scraped from a proxy source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySource {
    /// Value of the `CACHE_NAME` constant, if declared
    pub cache_name: Option<String>,

    /// Entries of the `PRECACHE_URLS` array, in declaration order
    pub precache_urls: Vec<String>,
}

impl ProxySource {
    /// Extract the cache name and precache list from source text
    pub fn parse(text: &str) -> Self {
        let cache_name = CACHE_NAME_REGEX
            .captures(text)
            .map(|caps| caps[1].trim().to_string());

        let precache_urls = PRECACHE_LIST_REGEX
            .captures(text)
            .map(|caps| {
                STRING_LITERAL_REGEX
                    .captures_iter(&caps[1])
                    .filter_map(|lit| lit.get(1).or_else(|| lit.get(2)))
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|entry| !entry.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            cache_name,
            precache_urls,
        }
    }

    /// Read and parse a proxy source file
    pub async fn load(path: &Path) -> PrecacheResult<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PrecacheError::io(format!("reading {}", path.display()), e))?;
        Ok(Self::parse(&text))
    }

    /// Version token of the cache name, given the expected prefix
    pub fn token(&self, prefix: &str) -> Option<&str> {
        let name = self.cache_name.as_deref()?;
        CacheNamespace::token_of(prefix, name)
    }

    /// The cache name split into prefix and token
    ///
    /// Errors when the constant is missing or does not start with `prefix`.
    pub fn namespace(&self, prefix: &str, path: &Path) -> PrecacheResult<CacheNamespace> {
        let token = self.token(prefix).ok_or_else(|| PrecacheError::ProxySourceInvalid {
            path: path.to_path_buf(),
            reason: match &self.cache_name {
                Some(name) => format!("cache name '{}' does not start with '{}-'", name, prefix),
                None => "no CACHE_NAME constant".to_string(),
            },
        })?;
        Ok(CacheNamespace::from_token(prefix, token))
    }
}
