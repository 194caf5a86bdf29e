//! One-hop request-forwarding proxy with CORS/cache header rewriting.
//!
//! Every inbound request (any method, any path) is re-issued against a
//! configured upstream origin with its path and query preserved, and the
//! upstream answer is returned with exactly two headers overridden: an open
//! `Access-Control-Allow-Origin` and a public one-hour `Cache-Control`.
//! Everything else is transparent pass-through: no authentication, no rate
//! limiting, no path rewriting, no retries.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONNECTION,
    CONTENT_LENGTH, HOST, TRANSFER_ENCODING,
};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Router;
use clipcue_config::ProxyConfig;
use reqwest::redirect;
use thiserror::Error;

const MAX_REDIRECTS: usize = 10;
const CORS_ALLOW_ANY: &str = "*";
const PUBLIC_ONE_HOUR: &str = "public, max-age=3600";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid upstream target: {0}")]
    Target(String),
    #[error("proxy client build failed: {0}")]
    Client(String),
}

/// The configured origin requests are forwarded to.
///
/// A bare host means `https://<host>`; a full `http(s)://` origin is
/// accepted as-is so local deployments and tests can point at plain-HTTP
/// upstreams.
///
/// ```
/// use clipcue_proxy::UpstreamTarget;
///
/// let target = UpstreamTarget::parse("backend.example.app").unwrap();
/// assert_eq!(target.origin(), "https://backend.example.app");
///
/// let local = UpstreamTarget::parse("http://127.0.0.1:5000").unwrap();
/// assert_eq!(local.origin(), "http://127.0.0.1:5000");
/// ```
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    origin: String,
}

impl UpstreamTarget {
    pub fn parse(raw: &str) -> Result<Self, ProxyError> {
        let raw = raw.trim().trim_end_matches('/');
        if raw.is_empty() {
            return Err(ProxyError::Target("empty upstream host".into()));
        }
        let origin = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("https://{raw}")
        };
        let parsed = reqwest::Url::parse(&origin)
            .map_err(|e| ProxyError::Target(format!("{raw}: {e}")))?;
        if parsed.host_str().is_none() {
            return Err(ProxyError::Target(format!("{raw}: missing host")));
        }
        Ok(Self { origin })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Outbound address for an inbound path + query, host substituted,
    /// everything after the origin untouched.
    fn address_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.origin, path_and_query)
    }
}

/// Shared per-process state: one upstream target, one outbound client.
pub struct ProxyState {
    target: UpstreamTarget,
    client: reqwest::Client,
}

impl ProxyState {
    pub fn new(target: UpstreamTarget) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| ProxyError::Client(e.to_string()))?;
        Ok(Self { target, client })
    }
}

/// Build the proxy router: a single fallback handler catches every
/// method/path combination.
pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new().fallback(forward).with_state(state)
}

/// Override exactly two headers on an upstream header set; all other
/// entries are left untouched.
pub fn rewrite_headers(headers: &mut HeaderMap) {
    headers.insert(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(CORS_ALLOW_ANY),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(PUBLIC_ONE_HOUR));
}

async fn forward(State(state): State<Arc<ProxyState>>, req: Request) -> Response {
    let (parts, body) = req.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let address = state.target.address_for(path_and_query);

    let body_bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => return synthetic_error(&address, e),
    };

    // Hop-by-hop entries are re-derived by the outbound transport; copying
    // them verbatim would describe the previous hop, not this one.
    let mut headers = parts.headers;
    for name in [HOST, CONTENT_LENGTH, TRANSFER_ENCODING, CONNECTION] {
        headers.remove(&name);
    }

    tracing::debug!(
        method=%parts.method,
        address=%address,
        body_len=body_bytes.len(),
        "proxy.forward"
    );

    let upstream = state
        .client
        .request(parts.method, &address)
        .headers(headers)
        .body(body_bytes)
        .send()
        .await;

    let upstream = match upstream {
        Ok(resp) => resp,
        Err(e) => return synthetic_error(&address, e),
    };

    let status = upstream.status();
    let mut resp_headers = upstream.headers().clone();
    let resp_body = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => return synthetic_error(&address, e),
    };

    for name in [CONTENT_LENGTH, TRANSFER_ENCODING, CONNECTION] {
        resp_headers.remove(&name);
    }
    rewrite_headers(&mut resp_headers);

    tracing::debug!(
        %status,
        body_len=resp_body.len(),
        "proxy.respond"
    );

    let mut builder = Response::builder().status(status);
    if let Some(h) = builder.headers_mut() {
        *h = resp_headers;
    }
    match builder.body(Body::from(resp_body)) {
        Ok(resp) => resp,
        Err(e) => synthetic_error(&address, e),
    }
}

/// Terminal failure: one synthetic 500 carrying the reason, never retried.
fn synthetic_error(address: &str, err: impl std::fmt::Display) -> Response {
    let message = err.to_string();
    tracing::warn!(address=%address, message=%message, "proxy.forward_failed");
    let mut resp = Response::new(Body::from(format!("Error: {message}")));
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp
}

/// Bind and serve the proxy until ctrl-c.
pub async fn serve(cfg: &ProxyConfig) -> anyhow::Result<()> {
    let host = cfg
        .upstream_host
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("proxy.upstream_host is not configured"))?;
    let target = UpstreamTarget::parse(host)?;
    let state = Arc::new(ProxyState::new(target.clone())?);

    let listener = tokio::net::TcpListener::bind(&cfg.listen).await?;
    tracing::info!(listen=%cfg.listen, upstream=%target.origin(), "proxy.listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("proxy.shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https_scheme() {
        let t = UpstreamTarget::parse("backend.example.app").unwrap();
        assert_eq!(t.origin(), "https://backend.example.app");
        assert_eq!(
            t.address_for("/api/x?y=1"),
            "https://backend.example.app/api/x?y=1"
        );
    }

    #[test]
    fn explicit_origin_and_trailing_slash() {
        let t = UpstreamTarget::parse("http://127.0.0.1:5000/").unwrap();
        assert_eq!(t.address_for("/generate"), "http://127.0.0.1:5000/generate");
    }

    #[test]
    fn empty_or_hostless_targets_are_rejected() {
        assert!(UpstreamTarget::parse("").is_err());
        assert!(UpstreamTarget::parse("   ").is_err());
        assert!(UpstreamTarget::parse("file:///etc/passwd").is_err());
    }

    #[test]
    fn rewrite_sets_exactly_the_two_policy_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-foo", HeaderValue::from_static("bar"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

        rewrite_headers(&mut headers);

        assert_eq!(headers.get("x-foo").unwrap(), "bar");
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "public, max-age=3600");
        assert_eq!(headers.len(), 3);
    }
}
