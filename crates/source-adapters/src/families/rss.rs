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

//! The RSS/Atom family (§4.2). `feed-rs` normalizes both dialects into one
//! `feed_rs::model::Feed`, so this adapter only maps `Entry` fields onto
//! `NewsItem` rather than hand-rolling two XML shapes.

use crate::adapter::{AdapterCore, SourceAdapter};
use crate::config::RssAdapterConfig;
use crate::resilience::{fetch_with_resilience, source_from_tag, synthetic_placeholder};
use async_trait::async_trait;
use news_client::{FetchRuntime, ResponseType};
use news_core::{NewsItem, Result};
use std::sync::Arc;
use tracing::instrument;

pub struct RssAdapter {
  source_id: String,
  source_name: String,
  config: RssAdapterConfig,
  runtime: Arc<FetchRuntime>,
  core: AdapterCore,
}

impl RssAdapter {
  pub fn new(
    source_id: impl Into<String>,
    source_name: impl Into<String>,
    config: RssAdapterConfig,
    runtime: Arc<FetchRuntime>,
    cache_ttl_seconds: i64,
  ) -> Self {
    Self {
      source_id: source_id.into(),
      source_name: source_name.into(),
      config,
      runtime,
      core: AdapterCore::new(cache_ttl_seconds),
    }
  }

  fn parse(&self, body: &[u8]) -> Vec<NewsItem> {
    let feed = match feed_rs::parser::parse(body) {
      Ok(feed) => feed,
      Err(_) => return Vec::new(),
    };

    feed.entries.into_iter().filter_map(|entry| self.map_entry(entry)).collect()
  }

  fn map_entry(&self, entry: feed_rs::model::Entry) -> Option<NewsItem> {
    let title = entry.title.map(|t| collapse_whitespace(&t.content))?;
    if title.is_empty() {
      return None;
    }

    let url = entry
      .links
      .iter()
      .find(|l| l.rel.as_deref().map(|r| r == "alternate").unwrap_or(true))
      .or_else(|| entry.links.first())
      .map(|l| l.href.clone())?;

    let id = news_core::id::from_natural_key(&self.source_id, &entry.id);

    let published_at = entry
      .published
      .or(entry.updated)
      .map(|dt| dt.naive_utc());

    let summary = entry.summary.map(|s| collapse_whitespace(&s.content));
    let content = entry.content.and_then(|c| c.body).map(|b| collapse_whitespace(&b));

    let image_url = entry
      .media
      .iter()
      .flat_map(|m| m.content.iter())
      .find_map(|c| c.url.as_ref().map(|u| u.to_string()));

    Some(NewsItem {
      id,
      source_id: self.source_id.clone(),
      source_name: self.source_name.clone(),
      title,
      url,
      mobile_url: None,
      content,
      summary,
      image_url,
      published_at,
      extra: Default::default(),
    })
  }
}

fn collapse_whitespace(text: &str) -> String {
  text.split_whitespace().collect::<Vec<_>>().join(" ").trim().to_string()
}

#[async_trait]
impl SourceAdapter for RssAdapter {
  #[instrument(skip(self), fields(source_id = %self.source_id))]
  async fn fetch(&self, force: bool) -> Result<Vec<NewsItem>> {
    self
      .core
      .fetch_with(force, || async {
        let outcome = fetch_with_resilience(
          &self.runtime,
          &self.source_id,
          &self.config.resilience,
          &self.config.url,
          ResponseType::Bytes,
          false,
          None,
        )
        .await;

        match outcome {
          Ok((response, origin, url_used)) => {
            let body = response.as_bytes().unwrap_or_default();
            let mut items = self.parse(body);
            if let Some(tag) = source_from_tag(origin, &url_used) {
              for item in &mut items {
                item.extra.insert("source_from".to_string(), serde_json::json!(tag));
              }
            }
            Ok(items)
          }
          Err(e) => {
            if self.config.resilience.synthetic_fallback {
              Ok(vec![synthetic_placeholder(&self.source_id, &self.source_name)])
            } else {
              Err(e)
            }
          }
        }
      })
      .await
  }

  async fn clear_cache(&self) {
    self.core.clear().await;
  }

  fn source_id(&self) -> &str {
    &self.source_id
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ResilienceConfig;

  fn adapter() -> RssAdapter {
    let proxy_manager = Arc::new(news_client::ProxyManager::new(Vec::new()));
    let runtime =
      Arc::new(FetchRuntime::new(news_client::FetchConfig::default(), proxy_manager).unwrap());
    let config =
      RssAdapterConfig { url: "https://example.com/feed.xml".to_string(), resilience: ResilienceConfig::default() };
    RssAdapter::new("site", "Site", config, runtime, 300)
  }

  const RSS_XML: &str = r#"<?xml version="1.0"?>
    <rss version="2.0"><channel>
      <title>Example</title>
      <item>
        <title>Hello <![CDATA[World]]></title>
        <link>https://example.com/1</link>
        <guid>story-1</guid>
        <pubDate>Tue, 28 Jul 2026 10:00:00 GMT</pubDate>
        <description>a   summary</description>
      </item>
    </channel></rss>"#;

  #[test]
  fn test_parse_rss_item_maps_fields() {
    let items = adapter().parse(RSS_XML.as_bytes());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Hello World");
    assert_eq!(items[0].url, "https://example.com/1");
    assert!(items[0].published_at.is_some());
    assert_eq!(items[0].summary.as_deref(), Some("a summary"));
  }

  #[test]
  fn test_parse_invalid_xml_returns_empty() {
    assert!(adapter().parse(b"not xml").is_empty());
  }

  const ATOM_XML: &str = r#"<?xml version="1.0"?>
    <feed xmlns="http://www.w3.org/2005/Atom">
      <title>Example</title>
      <entry>
        <title>Atom story</title>
        <link href="https://example.com/2"/>
        <id>story-2</id>
        <updated>2026-07-28T10:00:00Z</updated>
        <summary>atom summary</summary>
      </entry>
    </feed>"#;

  #[test]
  fn test_parse_atom_entry_maps_fields() {
    let items = adapter().parse(ATOM_XML.as_bytes());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Atom story");
    assert_eq!(items[0].url, "https://example.com/2");
  }
}
