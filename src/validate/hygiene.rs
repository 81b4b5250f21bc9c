//! Site hygiene checks
//!
//! Web-app manifest links, safe `target="_blank"` anchors, absolute sitemap
//! and robots declarations, and local references that resolve to files
//! inside the site root.

use super::{Violation, ViolationKind};
use crate::config::Config;
use crate::error::{PrecacheError, PrecacheResult};
use crate::site::{self, Page};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

static MANIFEST_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link\b[^>]*\brel\s*=\s*["']manifest["'][^>]*>"#)
        .expect("Invalid manifest link regex")
});

static TARGET_BLANK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\b[^>]*\btarget\s*=\s*["']_blank["'][^>]*>"#)
        .expect("Invalid target blank regex")
});

static REL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\brel\s*=\s*["']([^"']*)["']"#).expect("Invalid rel regex")
});

static LOC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<loc>([^<]*)</loc>").expect("Invalid loc regex"));

static HTML_REF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:src|href|data-src)\s*=\s*["']([^"']+)["']"#)
        .expect("Invalid reference regex")
});

static CSS_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]+)"|'([^']+)'|([^'")\s]+))\s*\)"#)
        .expect("Invalid css url regex")
});

/// Directories never scanned for stylesheets
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target"];

/// Run every hygiene check against the site root
pub async fn check_hygiene(
    root: &Path,
    pages: &[Page],
    config: &Config,
) -> PrecacheResult<Vec<Violation>> {
    let mut violations = Vec::new();

    for page in pages {
        violations.extend(manifest_link(page));
        violations.extend(unsafe_target_blank(page));
    }

    if let Some(xml) = site::read_optional(&root.join("sitemap.xml")).await? {
        violations.extend(relative_sitemap_locs(&xml));
    }
    if let Some(robots) = site::read_optional(&root.join("robots.txt")).await? {
        violations.extend(robots_sitemap(&robots));
    }

    for page in pages {
        for raw in html_references(&page.text) {
            violations.extend(check_reference(root, Path::new(""), &page.name, &raw).await);
        }
    }

    for css in stylesheets(root, &config.dist.out_dir).await? {
        let Ok(relative) = css.strip_prefix(root) else {
            continue;
        };
        let from_dir = relative.parent().unwrap_or(Path::new(""));
        let label = relative.to_string_lossy().replace('\\', "/");
        let text = site::read_text(&css).await?;
        for raw in css_references(&text) {
            violations.extend(check_reference(root, from_dir, &label, &raw).await);
        }
    }

    Ok(violations)
}

fn manifest_link(page: &Page) -> Option<Violation> {
    (!MANIFEST_LINK_REGEX.is_match(&page.text)).then(|| {
        Violation::new(
            ViolationKind::Html,
            format!("missing web app manifest link: {}", page.name),
        )
    })
}

fn unsafe_target_blank(page: &Page) -> Option<Violation> {
    let unsafe_anchor = TARGET_BLANK_REGEX.find_iter(&page.text).any(|tag| {
        let rel = REL_REGEX
            .captures(tag.as_str())
            .map(|caps| caps[1].to_ascii_lowercase())
            .unwrap_or_default();
        let words: Vec<&str> = rel.split_whitespace().collect();
        !(words.contains(&"noopener") && words.contains(&"noreferrer"))
    });

    unsafe_anchor.then(|| {
        Violation::new(
            ViolationKind::Html,
            format!(
                "target=\"_blank\" without rel=\"noopener noreferrer\": {}",
                page.name
            ),
        )
    })
}

fn relative_sitemap_locs(xml: &str) -> Vec<Violation> {
    LOC_REGEX
        .captures_iter(xml)
        .map(|caps| caps[1].trim().to_string())
        .filter(|loc| !is_absolute_http(loc))
        .map(|loc| {
            let shown = if loc.is_empty() { "(empty)".to_string() } else { loc };
            Violation::new(
                ViolationKind::Sitemap,
                format!("<loc> must be an absolute URL: {}", shown),
            )
        })
        .collect()
}

fn robots_sitemap(robots: &str) -> Option<Violation> {
    let declared: Vec<&str> = robots
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let head = line.get(..8)?;
            head.eq_ignore_ascii_case("sitemap:")
                .then(|| line[8..].trim())
        })
        .collect();

    if declared.is_empty() {
        return Some(Violation::new(
            ViolationKind::Robots,
            "robots.txt declares no Sitemap:",
        ));
    }
    if !declared.iter().any(|url| is_absolute_http(url)) {
        return Some(Violation::new(
            ViolationKind::Robots,
            "robots.txt needs at least one absolute Sitemap: URL",
        ));
    }
    None
}

fn is_absolute_http(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn html_references(text: &str) -> Vec<String> {
    HTML_REF_REGEX
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn css_references(text: &str) -> Vec<String> {
    CSS_URL_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Where a local reference points, relative to the site root
#[derive(Debug, PartialEq, Eq)]
enum Resolved {
    /// Not a local file reference
    Skip,
    /// Climbs above the site root
    Escapes,
    Local(PathBuf),
}

fn resolve_reference(from_dir: &Path, raw: &str) -> Resolved {
    let reference = raw.trim();
    let lower = reference.to_ascii_lowercase();
    let external = ["http://", "https://", "//", "mailto:", "tel:", "javascript:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme));
    if reference.is_empty() || reference.starts_with('#') || external {
        return Resolved::Skip;
    }

    let cleaned = reference
        .split('#')
        .next()
        .unwrap_or_default()
        .split('?')
        .next()
        .unwrap_or_default();
    if cleaned.is_empty() {
        return Resolved::Skip;
    }

    let (base, rest) = match cleaned.strip_prefix('/') {
        Some(rest) => (Path::new(""), rest),
        None => (from_dir, cleaned),
    };

    let mut parts: Vec<String> = base
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Resolved::Escapes;
                }
            }
            part => parts.push(part.to_string()),
        }
    }

    Resolved::Local(parts.iter().collect())
}

async fn check_reference(root: &Path, from_dir: &Path, label: &str, raw: &str) -> Option<Violation> {
    match resolve_reference(from_dir, raw) {
        Resolved::Skip => None,
        Resolved::Escapes => Some(Violation::new(
            ViolationKind::Path,
            format!("reference leaves the site root: {} -> {}", label, raw),
        )),
        Resolved::Local(relative) => {
            if site::is_file(&root.join(&relative)).await {
                None
            } else {
                Some(Violation::new(
                    ViolationKind::Miss,
                    format!(
                        "{} -> {} (resolved to {})",
                        label,
                        raw,
                        relative.to_string_lossy().replace('\\', "/")
                    ),
                ))
            }
        }
    }
}

/// Stylesheets anywhere under the root, skipping build output and tooling dirs
async fn stylesheets(root: &Path, out_dir: &str) -> PrecacheResult<Vec<PathBuf>> {
    let root = root.to_path_buf();
    let out_dir = root.join(out_dir);

    tokio::task::spawn_blocking(move || {
        let mut found: Vec<PathBuf> = WalkDir::new(&root)
            .into_iter()
            .filter_entry(|entry| {
                let skipped = entry.file_type().is_dir()
                    && (entry.path() == out_dir
                        || SKIPPED_DIRS
                            .iter()
                            .any(|dir| entry.file_name() == std::ffi::OsStr::new(dir)));
                !skipped
            })
            .flatten()
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("css"))
            })
            .map(|entry| entry.into_path())
            .collect();
        found.sort();
        found
    })
    .await
    .map_err(|e| PrecacheError::Internal(format!("stylesheet scan failed: {}", e)))
}
