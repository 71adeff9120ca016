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

//! Shared resilience: try the primary URL, then backups, then third-party
//! fallback APIs, before giving up (§4.2).

use crate::config::ResilienceConfig;
use chrono::Utc;
use news_client::{FetchRequest, FetchResponse, FetchRuntime, ResponseType};
use news_core::{NewsItem, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
  Primary,
  Backup,
  Fallback,
}

pub async fn fetch_with_resilience(
  runtime: &FetchRuntime,
  source_id: &str,
  resilience: &ResilienceConfig,
  primary_url: &str,
  response_type: ResponseType,
  needs_proxy: bool,
  proxy_group: Option<String>,
) -> Result<(FetchResponse, FetchOrigin, String)> {
  let mut candidates: Vec<(&str, FetchOrigin)> = vec![(primary_url, FetchOrigin::Primary)];
  candidates.extend(resilience.backup_urls.iter().map(|u| (u.as_str(), FetchOrigin::Backup)));
  candidates.extend(resilience.fallback_apis.iter().map(|u| (u.as_str(), FetchOrigin::Fallback)));

  let mut last_err = None;
  for (url, origin) in candidates {
    let request = FetchRequest::get(url)
      .response_type(response_type)
      .proxied(needs_proxy, proxy_group.clone())
      .retry_policy(resilience.max_retries, resilience.retry_base_delay_ms);
    match runtime.fetch(request).await {
      Ok(response) => return Ok((response, origin, url.to_string())),
      Err(e) => last_err = Some(e),
    }
  }

  Err(last_err.expect("at least the primary URL is always attempted").into_fetch_error(source_id).into())
}

/// The `extra.source_from` tag for an item obtained via `origin`/`url`: a
/// backup URL is tagged with its host (so callers can see which mirror
/// answered), a third-party fallback API is tagged `"fallback"`, and the
/// primary URL gets no tag at all.
pub fn source_from_tag(origin: FetchOrigin, url: &str) -> Option<String> {
  match origin {
    FetchOrigin::Primary => None,
    FetchOrigin::Backup => url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)).or_else(|| Some(url.to_string())),
    FetchOrigin::Fallback => Some("fallback".to_string()),
  }
}

/// The deterministic placeholder item returned when `synthetic_fallback` is
/// enabled and every resilience avenue above has been exhausted (§4.2/§9).
pub fn synthetic_placeholder(source_id: &str, source_name: &str) -> NewsItem {
  let id = news_core::id::from_natural_key(source_id, "synthetic-placeholder");
  let mut extra = HashMap::new();
  extra.insert("source_from".to_string(), serde_json::json!("synthetic"));
  NewsItem {
    id,
    source_id: source_id.to_string(),
    source_name: source_name.to_string(),
    title: format!("{source_name} is temporarily unavailable"),
    url: String::new(),
    mobile_url: None,
    content: None,
    summary: Some("This source could not be reached; showing a placeholder.".to_string()),
    image_url: None,
    published_at: Some(Utc::now().naive_utc()),
    extra,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_synthetic_placeholder_is_tagged() {
    let item = synthetic_placeholder("bbc", "BBC");
    assert_eq!(item.extra.get("source_from").unwrap(), "synthetic");
    assert_eq!(item.source_id, "bbc");
  }

  #[test]
  fn test_synthetic_placeholder_deterministic() {
    let a = synthetic_placeholder("bbc", "BBC");
    let b = synthetic_placeholder("bbc", "BBC");
    assert_eq!(a.id, b.id);
  }

  #[test]
  fn test_source_from_tag_primary_is_untagged() {
    assert_eq!(source_from_tag(FetchOrigin::Primary, "https://example.com/a"), None);
  }

  #[test]
  fn test_source_from_tag_backup_is_the_url_host() {
    assert_eq!(
      source_from_tag(FetchOrigin::Backup, "https://mirror.example.org/feed"),
      Some("mirror.example.org".to_string())
    );
  }

  #[test]
  fn test_source_from_tag_fallback_is_literal() {
    assert_eq!(source_from_tag(FetchOrigin::Fallback, "https://aggregator.example.com/hot"), Some("fallback".to_string()));
  }
}
