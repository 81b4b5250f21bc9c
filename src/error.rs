//! Error types for precache
//!
//! All modules use `PrecacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for precache operations
pub type PrecacheResult<T> = Result<T, PrecacheError>;

/// Exit status for usage errors (malformed or missing arguments)
pub const EXIT_USAGE: u8 = 2;

/// All errors that can occur in precache
#[derive(Error, Debug)]
pub enum PrecacheError {
    // Version errors
    #[error("Invalid version tag '{0}': expected YYYYMMDD.N, e.g. 20251218.4")]
    InvalidVersionTag(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Site root not found: {0}")]
    SiteRootNotFound(PathBuf),

    // Manifest generation errors
    #[error("Build output directory not found: {0}")]
    BuildOutputMissing(PathBuf),

    #[error("Build output {dir} has no {page}; the generated proxy would have no offline fallback")]
    OfflinePageMissing { dir: PathBuf, page: String },

    #[error("Proxy source {path} is unusable: {reason}")]
    ProxySourceInvalid { path: PathBuf, reason: String },

    // Release gate errors
    #[error("Validation failed with {0} violation(s)")]
    ValidationFailed(usize),

    // Proxy runtime errors
    #[error("Network request for {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Cache storage error: {0}")]
    CacheStorage(String),

    #[error("Install of {namespace} failed: {reason}")]
    InstallFailed { namespace: String, reason: String },

    #[error("Invalid lifecycle transition from {from} to {to}")]
    Lifecycle { from: String, to: String },

    #[error("Invalid URL '{input}': {source}")]
    Url {
        input: String,
        #[source]
        source: url::ParseError,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PrecacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a URL parse error
    pub fn url(input: impl Into<String>, source: url::ParseError) -> Self {
        Self::Url {
            input: input.into(),
            source,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidVersionTag(_) => EXIT_USAGE,
            _ => 1,
        }
    }

    /// Whether the proxy fallback chain may absorb this error
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::CacheStorage(_))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidVersionTag(_) => Some("Usage: precache bump <YYYYMMDD.N>"),
            Self::BuildOutputMissing(_) => Some("Run the site build before generating the proxy"),
            Self::OfflinePageMissing { .. } => {
                Some("Make sure the offline page is part of the build inputs")
            }
            Self::ValidationFailed(_) => Some("Run: precache bump <YYYYMMDD.N> to realign versions"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PrecacheError::InvalidVersionTag("2025-1".to_string());
        assert!(err.to_string().contains("2025-1"));
        assert!(err.to_string().contains("YYYYMMDD.N"));
    }

    #[test]
    fn error_hint() {
        let err = PrecacheError::ValidationFailed(3);
        assert_eq!(
            err.hint(),
            Some("Run: precache bump <YYYYMMDD.N> to realign versions")
        );
        assert!(PrecacheError::Internal("x".into()).hint().is_none());
    }

    #[test]
    fn error_exit_codes() {
        assert_eq!(PrecacheError::InvalidVersionTag("x".into()).exit_code(), 2);
        assert_eq!(PrecacheError::ValidationFailed(1).exit_code(), 1);
    }

    #[test]
    fn error_soft() {
        assert!(PrecacheError::network("http://a/", "refused").is_soft());
        assert!(PrecacheError::CacheStorage("full".into()).is_soft());
        assert!(!PrecacheError::Internal("x".into()).is_soft());
    }
}
