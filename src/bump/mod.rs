//! Version bump
//!
//! Rewrites every tracked asset reference on the root pages, the proxy's
//! namespace constant and header comment, and the status document marker
//! to a new tag. Files already at the tag are left alone, so bumping twice
//! to the same tag changes nothing the second time.

use crate::config::Config;
use crate::error::PrecacheResult;
use crate::site::{self, write_atomic};
use crate::version::{TrackedAsset, VersionTag};
use regex::{Captures, NoExpand, Regex};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

static PROXY_COMMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Cache version follows asset query:\s*\d{8}\.\d+")
        .expect("Invalid proxy comment regex")
});

/// Files rewritten by a bump
#[derive(Debug, Clone)]
pub struct BumpReport {
    pub tag: VersionTag,

    /// Files whose content changed, in write order
    pub changed: Vec<PathBuf>,
}

impl BumpReport {
    pub fn files_written(&self) -> usize {
        self.changed.len()
    }
}

/// Rewrites toward one target token
///
/// Patterns are compiled once and reused for every file of a bump.
pub struct Retagger<'a> {
    assets: &'a [TrackedAsset],
    token: &'a str,
    comment: String,
    cache_name: Regex,
    cache_name_replacement: String,
    status_marker: Regex,
    status_replacement: String,
}

impl<'a> Retagger<'a> {
    /// `prefix` names the proxy namespace; `status_label` the status
    /// document's marker label
    pub fn new(assets: &'a [TrackedAsset], prefix: &str, status_label: &str, token: &'a str) -> Self {
        let cache_name = Regex::new(&format!(
            r#"const\s+CACHE_NAME\s*=\s*(['"]){}-[^'"]+['"]\s*;"#,
            regex::escape(prefix)
        ))
        .expect("escaped prefix is a valid pattern");

        // Label may be wrapped in bold markers; colon may be ASCII or full-width
        let status_marker = Regex::new(&format!(
            r"({}\*{{0,2}}\s*[:：]\s*)`[^`]+`",
            regex::escape(status_label)
        ))
        .expect("escaped label is a valid pattern");

        Self {
            assets,
            token,
            comment: format!("Cache version follows asset query: {}", token),
            cache_name,
            cache_name_replacement: format!("{}-{}", prefix, token),
            status_marker,
            status_replacement: format!("`{}`", token),
        }
    }

    /// Point every tracked asset reference in a page at the token
    pub fn page(&self, text: &str) -> String {
        self.assets
            .iter()
            .fold(text.to_string(), |out, asset| asset.retag(&out, self.token))
    }

    /// Retag the proxy source: header comment, namespace constant, asset references
    pub fn proxy(&self, text: &str) -> String {
        let out = PROXY_COMMENT_REGEX.replace_all(text, NoExpand(&self.comment));
        let out = self.cache_name.replace_all(&out, |caps: &Captures<'_>| {
            format!(
                "const CACHE_NAME = {q}{}{q};",
                self.cache_name_replacement,
                q = &caps[1]
            )
        });
        self.page(&out)
    }

    /// Retag the status document's `<label>: `<tag>`` marker
    pub fn status(&self, text: &str) -> String {
        self.status_marker
            .replace_all(text, |caps: &Captures<'_>| {
                format!("{}{}", &caps[1], self.status_replacement)
            })
            .into_owned()
    }
}

/// Bump every versioned file under `root` to `tag`
///
/// All new contents are computed before anything is written.
pub async fn bump_version(
    root: &Path,
    tag: &VersionTag,
    config: &Config,
) -> PrecacheResult<BumpReport> {
    let retagger = Retagger::new(
        &config.assets,
        &config.site.cache_prefix,
        &config.site.status_marker,
        tag.as_str(),
    );
    let mut pending: Vec<(PathBuf, String)> = Vec::new();

    for page in site::page_paths(root).await? {
        let text = site::read_text(&page).await?;
        let next = retagger.page(&text);
        if next != text {
            pending.push((page, next));
        }
    }

    let proxy_path = root.join(&config.site.proxy_source);
    if let Some(text) = site::read_optional(&proxy_path).await? {
        let next = retagger.proxy(&text);
        if next != text {
            pending.push((proxy_path, next));
        }
    }

    let status_path = root.join(&config.site.status_doc);
    if let Some(text) = site::read_optional(&status_path).await? {
        let next = retagger.status(&text);
        if next != text {
            pending.push((status_path, next));
        }
    }

    let mut changed = Vec::with_capacity(pending.len());
    for (path, contents) in pending {
        write_atomic(&path, &contents).await?;
        debug!("Rewrote {}", path.display());
        changed.push(path);
    }

    info!("Bumped to {} ({} files written)", tag, changed.len());
    Ok(BumpReport {
        tag: tag.clone(),
        changed,
    })
}
