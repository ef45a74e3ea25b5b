// src/ingest/http.rs
//! Shared HTTP client for all source fetchers.
//!
//! One `reqwest::Client` per process, a fixed User-Agent, per-request timeouts
//! and an optional bearer token that is attached only when the caller asks for
//! it (GitHub endpoints). A rejected token degrades to one unauthenticated retry.

use anyhow::{anyhow, Context, Result};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("feature-forecast/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Auth {
    /// Attach the token if one is configured.
    Bearer,
    None,
}

#[derive(Clone)]
pub struct SourceClient {
    client: Client,
    token: Option<String>,
}

impl SourceClient {
    pub fn new(user_agent: &str, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("building http client")?;
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Ok(Self { client, token })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub async fn get_text(&self, url: &str, timeout: Duration, auth: Auth) -> Result<String> {
        let resp = self.send(url, timeout, auth).await?;
        resp.text()
            .await
            .with_context(|| format!("reading body of {url}"))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
        auth: Auth,
    ) -> Result<T> {
        let body = self.get_text(url, timeout, auth).await?;
        serde_json::from_str(&body).with_context(|| format!("parsing json from {url}"))
    }

    async fn send(&self, url: &str, timeout: Duration, auth: Auth) -> Result<reqwest::Response> {
        let with_token = auth == Auth::Bearer && self.token.is_some();
        let resp = self.request(url, timeout, with_token).send().await;
        let resp = match resp {
            Ok(r) => r,
            Err(e) => return Err(e).with_context(|| format!("GET {url}")),
        };

        if with_token && resp.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(url, "token rejected; retrying unauthenticated");
            let retry = self
                .request(url, timeout, false)
                .send()
                .await
                .with_context(|| format!("GET {url} (unauthenticated)"))?;
            return check_status(url, retry);
        }

        check_status(url, resp)
    }

    fn request(&self, url: &str, timeout: Duration, with_token: bool) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .get(url)
            .timeout(timeout)
            .header(header::ACCEPT, "application/json, application/rss+xml, */*");
        if with_token {
            if let Some(t) = &self.token {
                req = req.bearer_auth(t);
            }
        }
        req
    }
}

fn check_status(url: &str, resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if is_throttled(status, resp.headers()) {
        tracing::warn!(url, %status, "rate limited; configure a token to raise the quota");
        return Err(anyhow!("rate limited ({status}) for {url}"));
    }
    Err(anyhow!("GET {url} returned {status}"))
}

fn is_throttled(status: StatusCode, headers: &header::HeaderMap) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    status == StatusCode::FORBIDDEN
        && headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_token_is_treated_as_absent() {
        let c = SourceClient::new(DEFAULT_USER_AGENT, Some("   ".into())).unwrap();
        assert!(!c.has_token());
        let c = SourceClient::new(DEFAULT_USER_AGENT, Some(" abc ".into())).unwrap();
        assert!(c.has_token());
    }

    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Local endpoint that rejects any bearer token with 401 and answers
    /// `ok` otherwise. Records whether each request carried a token.
    async fn token_rejecting_server() -> (String, Arc<Mutex<Vec<bool>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else {
                    break;
                };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match sock.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&buf).to_lowercase();
                let bearer = head.contains("authorization: bearer");
                log.lock().unwrap().push(bearer);
                let reply = if bearer {
                    "HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                } else {
                    "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok"
                };
                let _ = sock.write_all(reply.as_bytes()).await;
                let _ = sock.shutdown().await;
            }
        });
        (format!("http://{addr}/"), seen)
    }

    #[tokio::test]
    async fn rejected_token_retries_once_without_it() {
        let (url, seen) = token_rejecting_server().await;
        let c = SourceClient::new(DEFAULT_USER_AGENT, Some("ghp_stale".into())).unwrap();
        let t = Duration::from_secs(5);

        let body = c.get_text(&url, t, Auth::Bearer).await.unwrap();
        assert_eq!(body, "ok");
        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn token_is_sent_only_for_bearer_requests() {
        let (url, seen) = token_rejecting_server().await;
        let t = Duration::from_secs(5);

        let with_token = SourceClient::new(DEFAULT_USER_AGENT, Some("ghp_x".into())).unwrap();
        assert_eq!(with_token.get_text(&url, t, Auth::None).await.unwrap(), "ok");

        let anonymous = SourceClient::new(DEFAULT_USER_AGENT, None).unwrap();
        assert_eq!(anonymous.get_text(&url, t, Auth::Bearer).await.unwrap(), "ok");

        assert_eq!(*seen.lock().unwrap(), vec![false, false]);
    }

    #[test]
    fn throttle_detection() {
        let mut h = header::HeaderMap::new();
        assert!(is_throttled(StatusCode::TOO_MANY_REQUESTS, &h));
        assert!(!is_throttled(StatusCode::FORBIDDEN, &h));
        h.insert("x-ratelimit-remaining", header::HeaderValue::from_static("0"));
        assert!(is_throttled(StatusCode::FORBIDDEN, &h));
        assert!(!is_throttled(StatusCode::NOT_FOUND, &h));
    }
}
