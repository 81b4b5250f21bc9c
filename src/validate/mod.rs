//! Release gate
//!
//! Checks that every page, the hand-authored proxy and its precache list
//! agree on one version tag, then runs the site hygiene checks. Every
//! violation is collected; nothing is corrected or guessed.

pub mod hygiene;
pub mod versions;

use crate::config::Config;
use crate::error::PrecacheResult;
use crate::manifest::ProxySource;
use crate::site;
use crate::version::VersionTag;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Category of a violation, printed as a bracketed tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationKind {
    /// Page markup
    Html,
    /// Proxy source and its precache list
    Proxy,
    /// Repository files
    Repo,
    Sitemap,
    Robots,
    /// Local reference escaping the site root
    Path,
    /// Local reference to a missing file
    Miss,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Html => "HTML",
            Self::Proxy => "PROXY",
            Self::Repo => "REPO",
            Self::Sitemap => "SITEMAP",
            Self::Robots => "ROBOTS",
            Self::Path => "PATH",
            Self::Miss => "MISS",
        };
        f.write_str(tag)
    }
}

/// One failed check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Outcome of a validation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,

    /// The single version tag every reference agrees on, if one exists
    pub canonical: Option<VersionTag>,

    /// Number of page documents checked
    pub pages: usize,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// One-line pass summary
    pub fn summary(&self) -> String {
        match &self.canonical {
            Some(tag) => format!("Version {} consistent across {} pages", tag, self.pages),
            None => format!("Checked {} pages", self.pages),
        }
    }
}

/// Run every check against a site root
pub async fn validate_site(root: &Path, config: &Config) -> PrecacheResult<ValidationReport> {
    let pages = site::load_pages(root).await?;
    debug!("Validating {} pages under {}", pages.len(), root.display());

    let proxy_path = root.join(&config.site.proxy_source);
    let proxy = site::read_optional(&proxy_path)
        .await?
        .map(|text| ProxySource::parse(&text));

    let mut report = ValidationReport {
        pages: pages.len(),
        ..ValidationReport::default()
    };

    let versions = versions::check_versions(&pages, proxy.as_ref(), config);
    report.canonical = versions.canonical;
    report.violations.extend(versions.violations);

    if proxy.is_none() {
        report.violations.push(Violation::new(
            ViolationKind::Repo,
            format!("missing proxy source: {}", config.site.proxy_source),
        ));
    }

    for required in &config.site.required_files {
        if !site::is_file(&root.join(required)).await {
            report.violations.push(Violation::new(
                ViolationKind::Repo,
                format!("missing required file: {}", required),
            ));
        }
    }

    if config.validate.site_checks {
        report
            .violations
            .extend(hygiene::check_hygiene(root, &pages, config).await?);
    }

    info!(
        "Validation finished: {} pages, {} violations",
        report.pages,
        report.violations.len()
    );
    Ok(report)
}
