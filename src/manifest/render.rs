//! Proxy source rendering for the build output

use crate::error::PrecacheResult;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

const TEMPLATE: &str = include_str!("sw_template.js");

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([A-Z][A-Z_]*?)__").expect("Invalid placeholder regex"));

/// Inputs for one rendered proxy
#[derive(Debug, Clone)]
pub struct RenderParams<'a> {
    pub cache_name: &'a str,
    pub precache_urls: &'a [String],
    pub offline_page: &'a str,
    pub index_page: &'a str,
    pub navigation_timeout_ms: u64,
    pub generated_at: DateTime<Utc>,
}

/// Render the proxy source text
///
/// String values are emitted as JSON literals, so any path is safely quoted.
/// The template is filled in a single pass; inserted values are never
/// scanned for placeholders again.
pub fn render_proxy(params: &RenderParams<'_>) -> PrecacheResult<String> {
    let values: HashMap<&str, String> = HashMap::from([
        (
            "GENERATED",
            params
                .generated_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
        ("CACHE_LABEL", comment_safe(params.cache_name)),
        ("CACHE_NAME", serde_json::to_string(params.cache_name)?),
        (
            "PRECACHE_URLS",
            serde_json::to_string_pretty(params.precache_urls)?,
        ),
        ("OFFLINE_PAGE", serde_json::to_string(params.offline_page)?),
        ("INDEX_PAGE", serde_json::to_string(params.index_page)?),
        ("NAV_TIMEOUT_MS", params.navigation_timeout_ms.to_string()),
    ]);

    let text = PLACEHOLDER_REGEX.replace_all(TEMPLATE, |caps: &Captures<'_>| {
        values
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    });
    Ok(text.into_owned())
}

/// Keep a value from closing the block comment it is placed in
fn comment_safe(value: &str) -> String {
    value.replace("*/", "* /")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::source::ProxySource;
    use chrono::TimeZone;

    fn render(urls: &[String]) -> String {
        render_proxy(&RenderParams {
            cache_name: "shop-dist-20260113.2",
            precache_urls: urls,
            offline_page: "offline.html",
            index_page: "index.html",
            navigation_timeout_ms: 4500,
            generated_at: Utc.with_ymd_and_hms(2026, 1, 13, 8, 0, 0).unwrap(),
        })
        .unwrap()
    }

    #[test]
    fn renders_constants() {
        let text = render(&["index.html".to_string(), "offline.html".to_string()]);
        assert!(text.contains(r#"const CACHE_NAME = "shop-dist-20260113.2";"#));
        assert!(text.contains(r#"const OFFLINE_PAGE = "offline.html";"#));
        assert!(text.contains("const NAVIGATION_TIMEOUT_MS = 4500;"));
        assert!(text.contains("2026-01-13T08:00:00.000Z"));
        assert!(!text.contains("__"));
    }

    #[test]
    fn rendered_proxy_handles_control_message_and_fallbacks() {
        let text = render(&[]);
        assert!(text.contains("'SKIP_WAITING'"));
        assert!(text.contains("status: 504"));
        assert!(text.contains("clients.claim()"));
    }

    #[test]
    fn placeholder_names_in_values_are_left_alone() {
        let urls = vec!["__INDEX_PAGE__.txt".to_string(), "offline.html".to_string()];
        let text = render(&urls);
        let source = ProxySource::parse(&text);
        assert_eq!(source.precache_urls, urls);
        assert!(text.contains(r#"const INDEX_PAGE = "index.html";"#));
    }

    #[test]
    fn cache_label_cannot_close_header_comment() {
        let text = render_proxy(&RenderParams {
            cache_name: "shop-*/__OFFLINE_PAGE__",
            precache_urls: &[],
            offline_page: "offline.html",
            index_page: "index.html",
            navigation_timeout_ms: 4500,
            generated_at: Utc.with_ymd_and_hms(2026, 1, 13, 8, 0, 0).unwrap(),
        })
        .unwrap();
        assert!(text.contains("Cache: shop-* /__OFFLINE_PAGE__"));
        assert_eq!(
            ProxySource::parse(&text).cache_name.as_deref(),
            Some("shop-*/__OFFLINE_PAGE__")
        );
    }

    #[test]
    fn rendered_proxy_reads_back() {
        let urls = vec!["a b.js".to_string(), "offline.html".to_string()];
        let source = ProxySource::parse(&render(&urls));
        assert_eq!(source.cache_name.as_deref(), Some("shop-dist-20260113.2"));
        assert_eq!(source.precache_urls, urls);
    }
}
