//! Version tags and cache namespaces
//!
//! A [`VersionTag`] (`YYYYMMDD.N`) is threaded through every versioned asset
//! reference (`styles/main.css?v=<tag>`) and through the proxy's
//! [`CacheNamespace`] (`<prefix>-<tag>`). Changing the tag changes the
//! namespace, which gives the proxy a fresh, independent cache store.

pub mod assets;

pub use assets::{AssetKind, TrackedAsset};

use crate::error::{PrecacheError, PrecacheResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}\.\d+$").expect("Invalid version tag regex"));

/// Shared version token in `YYYYMMDD.N` form
///
/// The system never orders tags itself; callers impose the ordering by
/// convention (date, then same-day counter).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionTag(String);

impl VersionTag {
    /// Parse and validate a tag, trimming surrounding whitespace
    pub fn parse(input: &str) -> PrecacheResult<Self> {
        let trimmed = input.trim();
        if VERSION_TAG_REGEX.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(PrecacheError::InvalidVersionTag(input.to_string()))
        }
    }

    /// Whether a raw token has the `YYYYMMDD.N` shape
    pub fn is_valid(input: &str) -> bool {
        VERSION_TAG_REGEX.is_match(input)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for VersionTag {
    type Err = PrecacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionTag {
    type Error = PrecacheError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionTag> for String {
    fn from(tag: VersionTag) -> Self {
        tag.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of one versioned cache store: `<prefix>-<token>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheNamespace {
    prefix: String,
    token: String,
}

impl CacheNamespace {
    /// Namespace for a validated version tag
    pub fn versioned(prefix: &str, tag: &VersionTag) -> Self {
        Self::from_token(prefix, tag.as_str())
    }

    /// Namespace for an arbitrary token (as scraped from a proxy source)
    pub fn from_token(prefix: &str, token: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            token: token.to_string(),
        }
    }

    /// Namespace keyed by a unix timestamp in milliseconds
    ///
    /// Used when no version token can be recovered, so every build still
    /// gets a store of its own.
    pub fn timestamped(prefix: &str, unix_millis: i64) -> Self {
        Self::from_token(prefix, &unix_millis.to_string())
    }

    /// Split a full cache name back into its token, given the expected prefix
    pub fn token_of<'a>(prefix: &str, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(prefix)?
            .strip_prefix('-')
            .filter(|token| !token.is_empty())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Full cache name
    pub fn name(&self) -> String {
        format!("{}-{}", self.prefix, self.token)
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.token)
    }
}
