/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! `FetchRuntime`: the shared HTTP transport (§4.3). Handles retries with
//! exponential backoff, a rotating desktop user-agent, redirect-following and
//! decompression (both delegated to `reqwest`'s built-in features), an
//! optional small HTTP response cache, and proxy routing via `ProxyManager`.

use crate::error::{TransportError, TransportResult};
use crate::proxy::ProxyManager;
use governor::{Quota, RateLimiter, clock::DefaultClock, state::{InMemoryState, NotKeyed}};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Desktop user agents rotated round-robin across requests, per §4.3 ("a
/// rotating desktop user-agent"); the browser-driven adapter family uses its
/// own UA list instead (see `source-adapters::families::browser`).
pub const DEFAULT_USER_AGENTS: &[&str] = &[
  "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
  "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
  "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
  Text,
  Json,
  Bytes,
}

#[derive(Debug, Clone)]
pub enum FetchResponse {
  Text(String),
  Json(serde_json::Value),
  Bytes(Vec<u8>),
}

impl FetchResponse {
  pub fn as_text(&self) -> Option<&str> {
    match self {
      FetchResponse::Text(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_json(&self) -> Option<&serde_json::Value> {
    match self {
      FetchResponse::Json(v) => Some(v),
      _ => None,
    }
  }

  pub fn as_bytes(&self) -> Option<&[u8]> {
    match self {
      FetchResponse::Bytes(b) => Some(b),
      _ => None,
    }
  }
}

/// A single outbound request, built with the fluent `FetchRequest::get`/`post`
/// constructors. Proxy routing is opted into per-request via `needs_proxy`
/// and `proxy_group`, mirroring how a `Source` row carries those fields.
#[derive(Debug, Clone)]
pub struct FetchRequest {
  pub url: String,
  pub method: reqwest::Method,
  pub headers: HashMap<String, String>,
  pub params: Vec<(String, String)>,
  pub body: Option<Vec<u8>>,
  pub response_type: ResponseType,
  pub timeout: Option<Duration>,
  pub use_cache: bool,
  pub needs_proxy: bool,
  pub proxy_group: Option<String>,
  /// Per-request override of `FetchConfig::max_retries`/`retry_base_delay_ms`,
  /// e.g. a source's own resilience config (§4.2). `None` falls back to the
  /// runtime's own defaults.
  pub retry_policy: Option<(u32, u64)>,
}

impl FetchRequest {
  pub fn get(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      method: reqwest::Method::GET,
      headers: HashMap::new(),
      params: Vec::new(),
      body: None,
      response_type: ResponseType::Text,
      timeout: None,
      use_cache: false,
      needs_proxy: false,
      proxy_group: None,
      retry_policy: None,
    }
  }

  pub fn response_type(mut self, response_type: ResponseType) -> Self {
    self.response_type = response_type;
    self
  }

  pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.insert(key.into(), value.into());
    self
  }

  pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.params.push((key.into(), value.into()));
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  pub fn use_cache(mut self, use_cache: bool) -> Self {
    self.use_cache = use_cache;
    self
  }

  pub fn proxied(mut self, needs_proxy: bool, proxy_group: Option<String>) -> Self {
    self.needs_proxy = needs_proxy;
    self.proxy_group = proxy_group;
    self
  }

  pub fn retry_policy(mut self, max_retries: u32, base_delay_ms: u64) -> Self {
    self.retry_policy = Some((max_retries, base_delay_ms));
    self
  }

  /// `sha1(method|url|canonicalized-params|body-hash)`, the cache key format
  /// from §6.
  fn cache_key(&self) -> String {
    let mut sorted_params = self.params.clone();
    sorted_params.sort();
    let params_str =
      sorted_params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
    let body_hash = self.body.as_deref().map(|b| {
      let mut hasher = Sha1::new();
      hasher.update(b);
      format!("{:x}", hasher.finalize())
    });
    let mut hasher = Sha1::new();
    hasher.update(self.method.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(self.url.as_bytes());
    hasher.update(b"|");
    hasher.update(params_str.as_bytes());
    hasher.update(b"|");
    hasher.update(body_hash.unwrap_or_default().as_bytes());
    format!("http:{:x}", hasher.finalize())
  }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
  pub connect_timeout: Duration,
  pub read_timeout: Duration,
  pub total_timeout: Duration,
  pub max_retries: u32,
  pub retry_base_delay_ms: u64,
  pub retry_status_codes: Vec<u16>,
  pub http_cache_ttl: Duration,
  /// Requests per minute against the shared client, the same per-process
  /// `governor` token bucket the teacher uses in `AlphaVantageClient`.
  pub rate_limit_per_minute: u32,
}

impl Default for FetchConfig {
  fn default() -> Self {
    Self {
      connect_timeout: Duration::from_secs(5),
      read_timeout: Duration::from_secs(10),
      total_timeout: Duration::from_secs(20),
      max_retries: 3,
      retry_base_delay_ms: 200,
      retry_status_codes: vec![429, 500, 502, 503, 504],
      http_cache_ttl: Duration::from_secs(30),
      rate_limit_per_minute: 600,
    }
  }
}

struct CachedEntry {
  response: FetchResponse,
  expires_at: Instant,
}

/// The process-wide, reference-counted HTTP transport (§5 "Shared-resource
/// policy"). `reqwest::Client` is internally an `Arc`, so cloning is cheap;
/// `FetchRuntime` itself is typically held behind an `Arc` by its owner.
pub struct FetchRuntime {
  client: reqwest::Client,
  proxied_clients: RwLock<HashMap<String, reqwest::Client>>,
  config: FetchConfig,
  proxy_manager: Arc<ProxyManager>,
  ua_counter: AtomicUsize,
  rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
  http_cache: RwLock<HashMap<String, CachedEntry>>,
}

impl FetchRuntime {
  pub fn new(config: FetchConfig, proxy_manager: Arc<ProxyManager>) -> TransportResult<Self> {
    let client = reqwest::Client::builder()
      .connect_timeout(config.connect_timeout)
      .timeout(config.total_timeout)
      .build()
      .map_err(|e| TransportError::Connection(format!("failed to build HTTP client: {e}")))?;

    let quota = Quota::per_minute(
      NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::new(600).unwrap()),
    );

    Ok(Self {
      client,
      proxied_clients: RwLock::new(HashMap::new()),
      config,
      proxy_manager,
      ua_counter: AtomicUsize::new(0),
      rate_limiter: RateLimiter::direct(quota),
      http_cache: RwLock::new(HashMap::new()),
    })
  }

  fn next_user_agent(&self) -> &'static str {
    let i = self.ua_counter.fetch_add(1, Ordering::Relaxed);
    DEFAULT_USER_AGENTS[i % DEFAULT_USER_AGENTS.len()]
  }

  fn client_for(&self, request: &FetchRequest) -> TransportResult<reqwest::Client> {
    let host = reqwest::Url::parse(&request.url)
      .ok()
      .and_then(|u| u.host_str().map(str::to_string))
      .unwrap_or_default();

    let needs_proxy = request.needs_proxy || self.proxy_manager.host_requires_proxy(&host);
    if !needs_proxy {
      return Ok(self.client.clone());
    }

    let group = request.proxy_group.as_deref().unwrap_or("default");
    let proxy = self
      .proxy_manager
      .pick(group)
      .ok_or_else(|| TransportError::ProxyExhausted(group.to_string()))?;

    if let Some(cached) = self.proxied_clients.read().expect("proxy client lock poisoned").get(&proxy.url()) {
      return Ok(cached.clone());
    }

    let proxied = reqwest::Proxy::all(&proxy.url())
      .map_err(|e| TransportError::Connection(format!("invalid proxy url: {e}")))?;
    let client = reqwest::Client::builder()
      .connect_timeout(self.config.connect_timeout)
      .timeout(self.config.total_timeout)
      .proxy(proxied)
      .build()
      .map_err(|e| TransportError::Connection(format!("failed to build proxied client: {e}")))?;

    self
      .proxied_clients
      .write()
      .expect("proxy client lock poisoned")
      .insert(proxy.url(), client.clone());
    Ok(client)
  }

  /// Execute one fetch, honoring retries, the HTTP cache, and proxy routing.
  #[instrument(skip(self, request), fields(url = %request.url, method = %request.method))]
  pub async fn fetch(&self, request: FetchRequest) -> TransportResult<FetchResponse> {
    if request.use_cache {
      let key = request.cache_key();
      if let Some(entry) = self.http_cache.read().expect("http cache lock poisoned").get(&key) {
        if entry.expires_at > Instant::now() {
          debug!("http cache hit for {}", request.url);
          return Ok(entry.response.clone());
        }
      }
    }

    let (max_retries, retry_base_delay_ms) =
      request.retry_policy.unwrap_or((self.config.max_retries, self.config.retry_base_delay_ms));

    let mut last_error = None;
    for attempt in 0..=max_retries {
      if attempt > 0 {
        let base = retry_base_delay_ms * 2u64.pow(attempt - 1);
        let jitter = (base as f64 * 0.2 * fastrand_like(attempt)) as u64;
        tokio::time::sleep(Duration::from_millis(base + jitter)).await;
      }

      self.rate_limiter.until_ready().await;

      match self.execute_once(&request).await {
        Ok(response) => {
          if request.use_cache {
            self.http_cache.write().expect("http cache lock poisoned").insert(
              request.cache_key(),
              CachedEntry { response: response.clone(), expires_at: Instant::now() + self.config.http_cache_ttl },
            );
          }
          return Ok(response);
        }
        Err(e) if e.is_retryable() && attempt < max_retries => {
          warn!("fetch attempt {} failed for {}: {}", attempt + 1, request.url, e);
          last_error = Some(e);
        }
        Err(e) => return Err(e),
      }
    }

    Err(last_error.unwrap_or(TransportError::Connection("max retries exceeded".to_string())))
  }

  async fn execute_once(&self, request: &FetchRequest) -> TransportResult<FetchResponse> {
    let client = self.client_for(request)?;
    let mut builder = client.request(request.method.clone(), &request.url);

    builder = builder.header("User-Agent", self.next_user_agent());
    for (k, v) in &request.headers {
      builder = builder.header(k, v);
    }
    if !request.params.is_empty() {
      builder = builder.query(&request.params);
    }
    if let Some(body) = &request.body {
      builder = builder.body(body.clone());
    }
    if let Some(timeout) = request.timeout {
      builder = builder.timeout(timeout);
    }

    let response = builder.send().await.map_err(|e| {
      if e.is_timeout() {
        TransportError::Timeout(request.timeout.unwrap_or(self.config.total_timeout))
      } else {
        TransportError::Connection(e.to_string())
      }
    })?;

    let status = response.status();
    if !status.is_success() {
      return Err(TransportError::HttpStatus(status.as_u16()));
    }

    match request.response_type {
      ResponseType::Text => {
        let text = response.text().await.map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(FetchResponse::Text(text))
      }
      ResponseType::Json => {
        let value: serde_json::Value =
          response.json().await.map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(FetchResponse::Json(value))
      }
      ResponseType::Bytes => {
        let bytes = response.bytes().await.map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(FetchResponse::Bytes(bytes.to_vec()))
      }
    }
  }
}

/// Deterministic, allocation-free "jitter" derived from the attempt number —
/// avoids pulling in a random-number crate purely for backoff smoothing.
fn fastrand_like(attempt: u32) -> f64 {
  let x = (attempt as u64).wrapping_mul(2654435761) % 1000;
  x as f64 / 1000.0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_retry_policy_defaults_to_none_and_is_settable() {
    let request = FetchRequest::get("http://x/a");
    assert_eq!(request.retry_policy, None);
    let overridden = FetchRequest::get("http://x/a").retry_policy(5, 50);
    assert_eq!(overridden.retry_policy, Some((5, 50)));
  }

  #[test]
  fn test_cache_key_stable_regardless_of_param_order() {
    let a = FetchRequest::get("http://x/a").param("b", "2").param("a", "1");
    let b = FetchRequest::get("http://x/a").param("a", "1").param("b", "2");
    assert_eq!(a.cache_key(), b.cache_key());
  }

  #[test]
  fn test_cache_key_differs_by_url() {
    let a = FetchRequest::get("http://x/a");
    let b = FetchRequest::get("http://x/b");
    assert_ne!(a.cache_key(), b.cache_key());
  }

  #[test]
  fn test_cache_key_differs_by_body() {
    let mut a = FetchRequest::get("http://x/a");
    a.body = Some(b"one".to_vec());
    let mut b = FetchRequest::get("http://x/a");
    b.body = Some(b"two".to_vec());
    assert_ne!(a.cache_key(), b.cache_key());
  }

  #[test]
  fn test_user_agent_rotation() {
    let proxy_manager = Arc::new(ProxyManager::new(vec![]));
    let runtime = FetchRuntime::new(FetchConfig::default(), proxy_manager).unwrap();
    let first = runtime.next_user_agent();
    let second = runtime.next_user_agent();
    let third = runtime.next_user_agent();
    assert_eq!(first, DEFAULT_USER_AGENTS[0]);
    assert_eq!(second, DEFAULT_USER_AGENTS[1]);
    assert_eq!(third, DEFAULT_USER_AGENTS[2]);
  }

  #[tokio::test]
  async fn test_client_for_without_proxy_returns_shared_client() {
    let proxy_manager = Arc::new(ProxyManager::new(vec![]));
    let runtime = FetchRuntime::new(FetchConfig::default(), proxy_manager).unwrap();
    let request = FetchRequest::get("http://example.com/a");
    assert!(runtime.client_for(&request).is_ok());
  }

  #[tokio::test]
  async fn test_client_for_fails_closed_when_proxy_required_but_none_healthy() {
    let proxy_manager = Arc::new(ProxyManager::new(vec!["example.com".to_string()]));
    let runtime = FetchRuntime::new(FetchConfig::default(), proxy_manager).unwrap();
    let request = FetchRequest::get("http://example.com/a");
    let err = runtime.client_for(&request).unwrap_err();
    assert!(matches!(err, TransportError::ProxyExhausted(_)));
  }
}
