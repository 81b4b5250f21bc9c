//! Network access for the proxy
//!
//! A fetch that yields any HTTP status is a response; only transport
//! failures (refused, reset, DNS, timeout) are errors.

use crate::error::{PrecacheError, PrecacheResult};
use crate::proxy::request::{Request, Response};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

/// Abstract network interface
#[async_trait]
pub trait Network: Send + Sync {
    /// Fetch a request from the network
    async fn fetch(&self, request: &Request) -> PrecacheResult<Response>;
}

/// HTTP network backed by a blocking `ureq` agent on the blocking pool
///
/// Response bodies are read in full with no size cap; precache entries can
/// be arbitrarily large build artifacts.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    agent: ureq::Agent,
}

impl HttpNetwork {
    /// Create a network with an overall per-request timeout
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for HttpNetwork {
    fn default() -> Self {
        Self::new(Some(Duration::from_secs(30)))
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> PrecacheResult<Response> {
        if request.method() != "GET" {
            return Err(PrecacheError::network(
                request.url().as_str(),
                format!("unsupported method {}", request.method()),
            ));
        }

        let agent = self.agent.clone();
        let url = request.url().to_string();
        let headers = request.headers().to_vec();

        tokio::task::spawn_blocking(move || {
            let mut builder = agent.get(&url);
            for (name, value) in headers {
                builder = builder.header(name, value);
            }

            let mut response = builder
                .call()
                .map_err(|e| PrecacheError::network(&url, e.to_string()))?;

            let status = response.status();
            let mut out = Response::new(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                response
                    .body_mut()
                    .with_config()
                    .limit(u64::MAX)
                    .read_to_vec()
                    .map_err(|e| PrecacheError::network(&url, e.to_string()))?,
            );
            for (name, value) in response.headers() {
                if let Ok(value) = value.to_str() {
                    out = out.with_header(name.as_str(), value);
                }
            }

            debug!("GET {} -> {}", url, out.status());
            Ok(out)
        })
        .await
        .map_err(|e| PrecacheError::Internal(format!("network task failed: {}", e)))?
    }
}

/// A network that is always unreachable
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNetwork;

#[async_trait]
impl Network for OfflineNetwork {
    async fn fetch(&self, request: &Request) -> PrecacheResult<Response> {
        Err(PrecacheError::network(request.url().as_str(), "offline"))
    }
}

/// Wraps a network with a switch that can cut connectivity
#[derive(Debug)]
pub struct ToggleNetwork<N> {
    inner: N,
    online: AtomicBool,
}

impl<N: Network> ToggleNetwork<N> {
    /// Wrap a network, initially online
    pub fn new(inner: N) -> Self {
        Self {
            inner,
            online: AtomicBool::new(true),
        }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<N: Network> Network for ToggleNetwork<N> {
    async fn fetch(&self, request: &Request) -> PrecacheResult<Response> {
        if !self.is_online() {
            return OfflineNetwork.fetch(request).await;
        }
        self.inner.fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    struct Echo;

    #[async_trait]
    impl Network for Echo {
        async fn fetch(&self, request: &Request) -> PrecacheResult<Response> {
            Ok(Response::ok(request.url().path().to_string()))
        }
    }

    fn req() -> Request {
        Request::get(Url::parse("https://shop.test/app.js").unwrap())
    }

    #[tokio::test]
    async fn offline_always_fails_softly() {
        let err = OfflineNetwork.fetch(&req()).await.unwrap_err();
        assert!(err.is_soft());
        assert!(err.to_string().contains("offline"));
    }

    #[tokio::test]
    async fn toggle_cuts_and_restores() {
        let net = ToggleNetwork::new(Echo);
        assert_eq!(net.fetch(&req()).await.unwrap().body().as_ref(), b"/app.js");

        net.set_online(false);
        assert!(net.fetch(&req()).await.is_err());

        net.set_online(true);
        assert!(net.fetch(&req()).await.is_ok());
    }

    /// Serve one canned response on a local port
    fn serve_once(body: Vec<u8>) -> Url {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
        });
        Url::parse(&format!("http://127.0.0.1:{}/big.bin", port)).unwrap()
    }

    #[tokio::test]
    async fn http_reads_bodies_past_default_limit() {
        let size = 11 * 1024 * 1024;
        let url = serve_once(vec![b'x'; size]);

        let response = HttpNetwork::default().fetch(&Request::get(url)).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.body().len(), size);
        assert!(response
            .headers()
            .iter()
            .any(|(name, value)| name.eq_ignore_ascii_case("content-length")
                && value == &size.to_string()));
    }

    #[tokio::test]
    async fn http_rejects_non_get() {
        let net = HttpNetwork::new(Some(Duration::from_millis(10)));
        let err = net.fetch(&req().with_method("POST")).await.unwrap_err();
        assert!(err.to_string().contains("unsupported method"));
    }
}
