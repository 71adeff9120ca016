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

//! The HTML scraping family (§4.2): configured CSS selectors over
//! `scraper::Html`, relative-link and relative-timestamp resolution.

use crate::adapter::{AdapterCore, SourceAdapter};
use crate::config::HtmlAdapterConfig;
use crate::dates;
use crate::resilience::{fetch_with_resilience, source_from_tag, synthetic_placeholder};
use async_trait::async_trait;
use chrono::Utc;
use news_client::{FetchRuntime, ResponseType};
use news_core::{NewsItem, Result};
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{instrument, warn};
use url::Url;

pub struct HtmlAdapter {
  source_id: String,
  source_name: String,
  config: HtmlAdapterConfig,
  runtime: Arc<FetchRuntime>,
  core: AdapterCore,
}

impl HtmlAdapter {
  pub fn new(
    source_id: impl Into<String>,
    source_name: impl Into<String>,
    config: HtmlAdapterConfig,
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

  fn resolve_url(&self, href: &str) -> String {
    if let Ok(base) = Url::parse(&self.config.base_url) {
      if let Ok(resolved) = base.join(href) {
        return resolved.to_string();
      }
    }
    href.to_string()
  }

  fn parse(&self, body: &str) -> Vec<NewsItem> {
    let document = Html::parse_document(body);
    let Ok(item_sel) = Selector::parse(&self.config.selectors.item) else {
      warn!(source_id = %self.source_id, "invalid item selector");
      return Vec::new();
    };
    let Ok(title_sel) = Selector::parse(&self.config.selectors.title) else {
      return Vec::new();
    };
    let Ok(url_sel) = Selector::parse(&self.config.selectors.url) else {
      return Vec::new();
    };
    let timestamp_sel = self.config.selectors.timestamp.as_deref().and_then(|s| Selector::parse(s).ok());
    let image_sel = self.config.selectors.image.as_deref().and_then(|s| Selector::parse(s).ok());
    let summary_sel = self.config.selectors.summary.as_deref().and_then(|s| Selector::parse(s).ok());

    let now = Utc::now().naive_utc();
    let mut items = Vec::new();

    for element in document.select(&item_sel) {
      let Some(title_el) = element.select(&title_sel).next() else { continue };
      let title: String = title_el.text().collect::<String>().trim().to_string();
      if title.is_empty() {
        continue;
      }

      let Some(url_el) = element.select(&url_sel).next() else { continue };
      let href = url_el.value().attr("href").unwrap_or_default();
      if href.is_empty() {
        continue;
      }
      let url = self.resolve_url(href);

      let published_at = timestamp_sel.as_ref().and_then(|sel| {
        element.select(sel).next().and_then(|el| {
          let text = el.text().collect::<String>();
          dates::parse_relative(text.trim(), now)
        })
      });

      let image_url = image_sel.as_ref().and_then(|sel| {
        element
          .select(sel)
          .next()
          .and_then(|el| el.value().attr("src").map(|s| self.resolve_url(s)))
      });

      let summary = summary_sel
        .as_ref()
        .and_then(|sel| element.select(sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty());

      let id = news_core::id::from_url(&self.source_id, &url);
      items.push(NewsItem {
        id,
        source_id: self.source_id.clone(),
        source_name: self.source_name.clone(),
        title,
        url,
        mobile_url: None,
        content: None,
        summary,
        image_url,
        published_at,
        extra: Default::default(),
      });
    }

    items
  }
}

#[async_trait]
impl SourceAdapter for HtmlAdapter {
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
          ResponseType::Text,
          false,
          None,
        )
        .await;

        match outcome {
          Ok((response, origin, url_used)) => {
            let body = response.as_text().unwrap_or_default();
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
  use crate::config::{HtmlSelectors, ResilienceConfig};

  fn config() -> HtmlAdapterConfig {
    HtmlAdapterConfig {
      url: "https://example.com/news".to_string(),
      base_url: "https://example.com".to_string(),
      selectors: HtmlSelectors {
        item: "div.item".to_string(),
        title: "h2".to_string(),
        url: "a".to_string(),
        timestamp: Some("span.time".to_string()),
        image: Some("img".to_string()),
        summary: Some("p".to_string()),
      },
      resilience: ResilienceConfig::default(),
    }
  }

  fn adapter() -> HtmlAdapter {
    let proxy_manager = Arc::new(news_client::ProxyManager::new(Vec::new()));
    let runtime =
      Arc::new(FetchRuntime::new(news_client::FetchConfig::default(), proxy_manager).unwrap());
    HtmlAdapter::new("site", "Site", config(), runtime, 300)
  }

  #[test]
  fn test_parse_extracts_fields_and_resolves_relative_links() {
    let html = r#"
      <div class="item">
        <h2>Breaking story</h2>
        <a href="/a/1">read</a>
        <span class="time">5 minutes ago</span>
        <img src="/img/1.png">
        <p>a short summary</p>
      </div>
    "#;
    let items = adapter().parse(html);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Breaking story");
    assert_eq!(items[0].url, "https://example.com/a/1");
    assert_eq!(items[0].image_url.as_deref(), Some("https://example.com/img/1.png"));
    assert_eq!(items[0].summary.as_deref(), Some("a short summary"));
    assert!(items[0].published_at.is_some());
  }

  #[test]
  fn test_parse_skips_items_missing_title_or_url() {
    let html = r#"<div class="item"><h2></h2></div>"#;
    let items = adapter().parse(html);
    assert!(items.is_empty());
  }

  #[test]
  fn test_parse_is_deterministic_for_same_url() {
    let html = r#"<div class="item"><h2>T</h2><a href="/x">l</a></div>"#;
    let a = adapter().parse(html);
    let b = adapter().parse(html);
    assert_eq!(a[0].id, b[0].id);
  }
}
