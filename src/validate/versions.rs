//! Version agreement between pages, proxy namespace and precache list

use super::{Violation, ViolationKind};
use crate::config::Config;
use crate::manifest::ProxySource;
use crate::site::Page;
use crate::version::{AssetKind, CacheNamespace, VersionTag};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static MODULE_TYPE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\btype\s*=\s*["']module["']"#).expect("Invalid module type regex")
});

/// Violations plus the tag every reference agrees on, if any
#[derive(Debug, Default)]
pub struct VersionCheck {
    pub violations: Vec<Violation>,
    pub canonical: Option<VersionTag>,
}

/// Check tag agreement across pages and the proxy source
///
/// The canonical tag resolves only when every observed reference carries
/// the same well-formed token. Checks that need it are skipped otherwise;
/// the disagreement itself is already reported.
pub fn check_versions(pages: &[Page], proxy: Option<&ProxySource>, config: &Config) -> VersionCheck {
    let mut check = VersionCheck::default();
    let mut observed: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();

    for page in pages {
        for asset in &config.assets {
            let tokens = asset.tokens_in(&page.text);
            if tokens.is_empty() {
                check.violations.push(Violation::new(
                    ViolationKind::Html,
                    format!("missing versioned reference {}?v=: {}", asset.path, page.name),
                ));
                continue;
            }

            for token in &tokens {
                if !VersionTag::is_valid(token) {
                    check.violations.push(Violation::new(
                        ViolationKind::Html,
                        format!(
                            "malformed version '{}' on {} (expected YYYYMMDD.N): {}",
                            token, asset.path, page.name
                        ),
                    ));
                }
            }

            if asset.kind == AssetKind::Module {
                let not_module = asset
                    .script_tag_regex()
                    .find_iter(&page.text)
                    .any(|tag| !MODULE_TYPE_REGEX.is_match(tag.as_str()));
                if not_module {
                    check.violations.push(Violation::new(
                        ViolationKind::Html,
                        format!("{} must be loaded with type=\"module\": {}", asset.path, page.name),
                    ));
                }
            }

            observed
                .entry(asset.path.as_str())
                .or_default()
                .extend(tokens);
        }
    }

    for (path, tokens) in &observed {
        if tokens.len() > 1 {
            check.violations.push(Violation::new(
                ViolationKind::Html,
                format!(
                    "{} carries {} different versions across pages: {}",
                    path,
                    tokens.len(),
                    join(tokens)
                ),
            ));
        }
    }

    let per_asset: BTreeSet<&String> = observed
        .values()
        .filter(|tokens| tokens.len() == 1)
        .flat_map(|tokens| tokens.iter())
        .collect();
    if per_asset.len() > 1 {
        let detail = observed
            .iter()
            .filter(|(_, tokens)| tokens.len() == 1)
            .map(|(path, tokens)| format!("{}={}", path, join(tokens)))
            .collect::<Vec<_>>()
            .join(", ");
        check.violations.push(Violation::new(
            ViolationKind::Html,
            format!("tracked assets disagree on the version: {}", detail),
        ));
    }

    let all: BTreeSet<&String> = observed.values().flatten().collect();
    check.canonical = match all.iter().next() {
        Some(token) if all.len() == 1 => VersionTag::parse(token).ok(),
        _ => None,
    };

    if let Some(proxy) = proxy {
        check_proxy(&mut check, pages, proxy, config);
    }
    check
}

fn check_proxy(check: &mut VersionCheck, pages: &[Page], proxy: &ProxySource, config: &Config) {
    let source = &config.site.proxy_source;
    let prefix = &config.site.cache_prefix;

    match (&proxy.cache_name, &check.canonical) {
        (None, _) => check.violations.push(Violation::new(
            ViolationKind::Proxy,
            format!("{} declares no CACHE_NAME", source),
        )),
        (Some(name), Some(tag)) => {
            let expected = CacheNamespace::versioned(prefix, tag).name();
            if name != &expected {
                check.violations.push(Violation::new(
                    ViolationKind::Proxy,
                    format!("CACHE_NAME '{}' does not match pages (expected '{}')", name, expected),
                ));
            }
        }
        (Some(_), None) => {}
    }

    if let Some(tag) = &check.canonical {
        for module in &config.validate.required_modules {
            let entry = format!("{}?v={}", module, tag);
            if !proxy.precache_urls.iter().any(|url| url == &entry) {
                check.violations.push(Violation::new(
                    ViolationKind::Proxy,
                    format!("precache list is missing {}", entry),
                ));
            }
        }
    }

    let index_page = config.proxy.index_page.as_str();
    for page in pages {
        if !proxy
            .precache_urls
            .iter()
            .any(|url| covers_page(url, &page.name, index_page))
        {
            check.violations.push(Violation::new(
                ViolationKind::Proxy,
                format!("precache list does not cover page {}", page.name),
            ));
        }
    }

    for url in &proxy.precache_urls {
        if is_external(url) {
            check.violations.push(Violation::new(
                ViolationKind::Proxy,
                format!("precache list contains external URL {}", url),
            ));
        }
    }

    let offline = config.proxy.offline_page.as_str();
    if !proxy
        .precache_urls
        .iter()
        .any(|url| covers_page(url, offline, index_page))
    {
        check.violations.push(Violation::new(
            ViolationKind::Proxy,
            format!("precache list is missing the offline page {}", offline),
        ));
    }
}

/// Whether a precache entry names a page
///
/// Accepts `name.html`, extensionless `name`, either with a `./` or `/`
/// prefix, and a bare `./` or `/` for the index page.
pub fn covers_page(entry: &str, page: &str, index_page: &str) -> bool {
    let entry = entry.trim();
    let path = entry
        .strip_prefix("./")
        .or_else(|| entry.strip_prefix('/'))
        .unwrap_or(entry);

    if path.is_empty() {
        return page == index_page;
    }
    if path == page {
        return true;
    }
    page.strip_suffix(".html").is_some_and(|stem| stem == path)
}

/// Whether a precache entry points off-origin
pub fn is_external(entry: &str) -> bool {
    let entry = entry.trim();
    entry.starts_with("http://") || entry.starts_with("https://") || entry.starts_with("//")
}

fn join(tokens: &BTreeSet<String>) -> String {
    tokens.iter().cloned().collect::<Vec<_>>().join(", ")
}
