//! Tracked asset references
//!
//! Pages reference a fixed set of static assets with a `?v=<tag>` query.
//! Each tracked asset knows how to find and rewrite its own references.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Characters that terminate a version query value inside markup or source
const TOKEN_CLASS: &str = r#"[^"'&#\s>)]+"#;

/// How an asset is loaded by a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// `<link rel="stylesheet">`
    Stylesheet,
    /// `<script type="module">`
    Module,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stylesheet => write!(f, "stylesheet"),
            Self::Module => write!(f, "module"),
        }
    }
}

/// A static asset whose references carry the shared version tag
///
/// Match patterns are compiled on first use and kept with the asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedAsset {
    /// Site-relative path, e.g. `styles/main.css`
    pub path: String,

    /// How pages load it
    pub kind: AssetKind,

    #[serde(skip)]
    patterns: OnceLock<Patterns>,
}

#[derive(Debug, Clone)]
struct Patterns {
    reference: Regex,
    script_tag: Regex,
}

impl PartialEq for TrackedAsset {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.kind == other.kind
    }
}

impl Eq for TrackedAsset {}

impl TrackedAsset {
    pub fn new(path: &str, kind: AssetKind) -> Self {
        Self {
            path: path.to_string(),
            kind,
            patterns: OnceLock::new(),
        }
    }

    /// The five assets every page is expected to reference
    pub fn default_set() -> Vec<Self> {
        vec![
            Self::new("styles/main.css", AssetKind::Stylesheet),
            Self::new("styles/extensions.css", AssetKind::Stylesheet),
            Self::new("scripts/motion.js", AssetKind::Module),
            Self::new("scripts/core.js", AssetKind::Module),
            Self::new("scripts/main.js", AssetKind::Module),
        ]
    }

    /// Versioned reference string: `<path>?v=<token>`
    pub fn versioned(&self, token: &str) -> String {
        format!("{}?v={}", self.path, token)
    }

    fn patterns(&self) -> &Patterns {
        self.patterns.get_or_init(|| {
            let path = regex::escape(&self.path);
            // Group 1 is the boundary before the path: start of text or a
            // delimiter, optionally followed by `/`, `./` or `../`
            let reference = Regex::new(&format!(
                r"((?:^|[^\w/.-])(?:\.{{0,2}}/)?){}\?v=({})",
                path, TOKEN_CLASS
            ))
            .expect("escaped asset path is a valid pattern");
            let script_tag = Regex::new(&format!(
                r#"(?i)<script\b[^>]*\bsrc\s*=\s*["'][^"']*{}\?v=[^"']*["'][^>]*>"#,
                path
            ))
            .expect("escaped asset path is a valid pattern");
            Patterns {
                reference,
                script_tag,
            }
        })
    }

    /// Pattern matching a versioned reference; group 2 is the token
    pub fn reference_regex(&self) -> &Regex {
        &self.patterns().reference
    }

    /// Pattern matching a `<script>` tag that loads this asset with a version query
    pub fn script_tag_regex(&self) -> &Regex {
        &self.patterns().script_tag
    }

    /// Every version token attached to this asset in `text`
    pub fn tokens_in(&self, text: &str) -> Vec<String> {
        self.reference_regex()
            .captures_iter(text)
            .map(|caps| caps[2].to_string())
            .collect()
    }

    /// Rewrite every versioned reference in `text` to carry `token`
    pub fn retag(&self, text: &str, token: &str) -> String {
        let replacement = self.versioned(token);
        self.reference_regex()
            .replace_all(text, |caps: &Captures<'_>| format!("{}{}", &caps[1], replacement))
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<link rel="stylesheet" href="styles/main.css?v=20260113.2">
<script type="module" src="scripts/main.js?v=20260113.2"></script>
<link rel="stylesheet" href="styles/main.css?v=20251218.1" />"#;

    #[test]
    fn default_set_has_five_assets() {
        let set = TrackedAsset::default_set();
        assert_eq!(set.len(), 5);
        assert_eq!(
            set.iter().filter(|a| a.kind == AssetKind::Module).count(),
            3
        );
    }

    #[test]
    fn tokens_in_collects_all_occurrences() {
        let asset = TrackedAsset::new("styles/main.css", AssetKind::Stylesheet);
        assert_eq!(asset.tokens_in(PAGE), vec!["20260113.2", "20251218.1"]);
    }

    #[test]
    fn tokens_in_does_not_confuse_similar_paths() {
        let asset = TrackedAsset::new("scripts/core.js", AssetKind::Module);
        assert!(asset.tokens_in(PAGE).is_empty());

        let dotted = TrackedAsset::new("styles/main.css", AssetKind::Stylesheet);
        assert!(dotted.tokens_in("styles/mainXcss?v=1").is_empty());
    }

    #[test]
    fn references_inside_longer_paths_are_not_tracked() {
        let asset = TrackedAsset::new("styles/main.css", AssetKind::Stylesheet);
        let text = r#"<link href="vendor/styles/main.css?v=9.9.9">
<link href="/theme-styles/main.css?v=9.9.9">
<link href="styles/main.css?v=20260113.2">"#;
        assert_eq!(asset.tokens_in(text), vec!["20260113.2"]);

        let out = asset.retag(text, "20260201.1");
        assert!(out.contains("vendor/styles/main.css?v=9.9.9"));
        assert!(out.contains("/theme-styles/main.css?v=9.9.9"));
        assert!(out.contains(r#"href="styles/main.css?v=20260201.1""#));
    }

    #[test]
    fn rooted_and_relative_references_are_tracked() {
        let asset = TrackedAsset::new("styles/main.css", AssetKind::Stylesheet);
        let text = "styles/main.css?v=1\n'/styles/main.css?v=2'\n\"./styles/main.css?v=3\"\n(../styles/main.css?v=4)";
        assert_eq!(asset.tokens_in(text), vec!["1", "2", "3", "4"]);

        let out = asset.retag(text, "20260201.1");
        assert_eq!(
            out,
            "styles/main.css?v=20260201.1\n'/styles/main.css?v=20260201.1'\n\"./styles/main.css?v=20260201.1\"\n(../styles/main.css?v=20260201.1)"
        );
    }

    #[test]
    fn equality_ignores_compiled_patterns() {
        let used = TrackedAsset::new("scripts/main.js", AssetKind::Module);
        assert!(used.tokens_in("x").is_empty());
        assert_eq!(used, TrackedAsset::new("scripts/main.js", AssetKind::Module));
    }

    #[test]
    fn retag_rewrites_every_reference() {
        let asset = TrackedAsset::new("styles/main.css", AssetKind::Stylesheet);
        let out = asset.retag(PAGE, "20260201.1");
        assert_eq!(asset.tokens_in(&out), vec!["20260201.1", "20260201.1"]);
        assert!(out.contains("scripts/main.js?v=20260113.2"));
    }

    #[test]
    fn script_tag_regex_finds_tag() {
        let asset = TrackedAsset::new("scripts/main.js", AssetKind::Module);
        let tag = asset.script_tag_regex().find(PAGE).unwrap().as_str();
        assert!(tag.contains(r#"type="module""#));
    }

    #[test]
    fn kind_serde_names() {
        let json = serde_json::to_string(&AssetKind::Module).unwrap();
        assert_eq!(json, "\"module\"");
    }
}
