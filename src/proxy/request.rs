//! Intercepted requests and the responses handed back to pages

use bytes::Bytes;
use url::Url;

/// Request mode as reported by the page that issued the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Top-level document load
    Navigate,
    /// Sub-resource load
    NoCors,
}

/// How the proxy treats an intercepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Network-first with timeout and cache fallback
    Navigation,
    /// Stale-while-revalidate
    StaticAsset,
}

/// An intercepted request
#[derive(Debug, Clone)]
pub struct Request {
    url: Url,
    method: String,
    mode: RequestMode,
    headers: Vec<(String, String)>,
}

impl Request {
    /// A plain GET sub-resource request
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: "GET".to_string(),
            mode: RequestMode::NoCors,
            headers: Vec::new(),
        }
    }

    /// A top-level navigation, as a browser would issue it
    pub fn navigate(url: Url) -> Self {
        Self::get(url)
            .with_mode(RequestMode::Navigate)
            .with_header("Accept", "text/html,application/xhtml+xml,*/*;q=0.8")
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Classify from request metadata, never from the URL shape
    pub fn class(&self) -> RequestClass {
        let accepts_html = self
            .header("accept")
            .is_some_and(|accept| accept.contains("text/html"));

        if self.mode == RequestMode::Navigate || accepts_html {
            RequestClass::Navigation
        } else {
            RequestClass::StaticAsset
        }
    }

    /// Key used to store and match this request in a cache store
    pub fn cache_key(&self) -> String {
        cache_key(&self.url)
    }
}

/// Cache key for a URL: the full URL without its fragment
pub fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

/// A response, either from the network or from a cache store
///
/// Bodies are reference counted, so cloning a response to write it into
/// a cache store does not copy the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    status_text: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Response {
    pub fn new(status: u16, status_text: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: status_text.to_string(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// 200 OK with the given body
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, "OK", body)
    }

    /// Synthetic response for an asset that is neither cached nor reachable
    pub fn gateway_timeout() -> Self {
        Self::new(504, "Offline", Bytes::new())
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Whether the status is in the 2xx range
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn navigate_mode_is_navigation() {
        let req = Request::get(url("https://shop.test/products")).with_mode(RequestMode::Navigate);
        assert_eq!(req.class(), RequestClass::Navigation);
    }

    #[test]
    fn html_accept_header_is_navigation() {
        let req = Request::get(url("https://shop.test/data.json")).with_header("Accept", "text/html");
        assert_eq!(req.class(), RequestClass::Navigation);
    }

    #[test]
    fn html_path_without_metadata_is_static() {
        // classification ignores the URL shape
        let req = Request::get(url("https://shop.test/index.html"));
        assert_eq!(req.class(), RequestClass::StaticAsset);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = Request::get(url("https://shop.test/")).with_header("ACCEPT", "text/css");
        assert_eq!(req.header("accept"), Some("text/css"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[test]
    fn cache_key_drops_fragment_keeps_query() {
        let req = Request::get(url("https://shop.test/styles/main.css?v=20260113.2#top"));
        assert_eq!(
            req.cache_key(),
            "https://shop.test/styles/main.css?v=20260113.2"
        );
    }

    #[test]
    fn method_is_uppercased() {
        let req = Request::get(url("https://shop.test/")).with_method("post");
        assert_eq!(req.method(), "POST");
    }

    #[test]
    fn gateway_timeout_shape() {
        let resp = Response::gateway_timeout();
        assert_eq!(resp.status(), 504);
        assert_eq!(resp.status_text(), "Offline");
        assert!(resp.body().is_empty());
        assert!(!resp.is_ok());
    }

    #[test]
    fn ok_range() {
        assert!(Response::new(204, "No Content", "").is_ok());
        assert!(!Response::new(304, "Not Modified", "").is_ok());
        assert!(!Response::new(404, "Not Found", "").is_ok());
    }
}
