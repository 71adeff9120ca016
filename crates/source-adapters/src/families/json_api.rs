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

//! The JSON-API family (§4.2): dot-path navigation to an items array plus a
//! configurable field map, with the id-generation priority order.

use crate::adapter::{AdapterCore, SourceAdapter};
use crate::config::JsonApiAdapterConfig;
use crate::dates;
use crate::resilience::{fetch_with_resilience, source_from_tag, synthetic_placeholder};
use async_trait::async_trait;
use news_client::{FetchRuntime, ResponseType};
use news_core::{NewsItem, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

pub struct JsonApiAdapter {
  source_id: String,
  source_name: String,
  config: JsonApiAdapterConfig,
  runtime: Arc<FetchRuntime>,
  core: AdapterCore,
}

impl JsonApiAdapter {
  pub fn new(
    source_id: impl Into<String>,
    source_name: impl Into<String>,
    config: JsonApiAdapterConfig,
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

  fn locate_items<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
    let node = match &self.config.items_path {
      Some(path) => path.split('.').fold(Some(root), |acc, segment| acc.and_then(|v| v.get(segment))),
      None => Some(root),
    };
    match node {
      Some(Value::Array(items)) => items.iter().collect(),
      _ => Vec::new(),
    }
  }

  fn field<'a>(&self, item: &'a Value, field_name: &str) -> Option<&'a Value> {
    item.get(field_name)
  }

  fn string_field(&self, item: &Value, field_name: &str) -> Option<String> {
    self.field(item, field_name).and_then(|v| match v {
      Value::String(s) => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      _ => None,
    })
  }

  fn parse_item(&self, raw: &Value) -> Option<NewsItem> {
    let fields = &self.config.fields;
    let title = self.string_field(raw, &fields.title_field)?;
    let url = self.string_field(raw, &fields.url_field)?;

    let id = if let Some(id_field) = &fields.id_field {
      match self.string_field(raw, id_field) {
        Some(id_value) => news_core::id::from_natural_key(&self.source_id, &id_value),
        None => news_core::id::from_url(&self.source_id, &url),
      }
    } else {
      news_core::id::from_url(&self.source_id, &url)
    };

    let published_at = fields
      .date_field
      .as_deref()
      .and_then(|f| self.string_field(raw, f))
      .and_then(|text| dates::parse_configured(&text, fields.date_format.as_deref()));

    let image_url = fields.image_field.as_deref().and_then(|f| self.string_field(raw, f));
    let summary = fields.summary_field.as_deref().and_then(|f| self.string_field(raw, f));
    let content = fields.content_field.as_deref().and_then(|f| self.string_field(raw, f));

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

  fn parse(&self, body: &Value) -> Vec<NewsItem> {
    self.locate_items(body).into_iter().filter_map(|raw| self.parse_item(raw)).collect()
  }
}

#[async_trait]
impl SourceAdapter for JsonApiAdapter {
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
          ResponseType::Json,
          false,
          None,
        )
        .await;

        match outcome {
          Ok((response, origin, url_used)) => {
            let body = response.as_json().cloned().unwrap_or(Value::Null);
            let mut items = self.parse(&body);
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
  use crate::config::{JsonFieldMap, ResilienceConfig};

  fn config(items_path: Option<&str>) -> JsonApiAdapterConfig {
    JsonApiAdapterConfig {
      url: "https://example.com/api/news".to_string(),
      items_path: items_path.map(|s| s.to_string()),
      fields: JsonFieldMap {
        id_field: Some("id".to_string()),
        title_field: "headline".to_string(),
        url_field: "link".to_string(),
        date_field: Some("published".to_string()),
        date_format: None,
        image_field: Some("image".to_string()),
        summary_field: Some("summary".to_string()),
        content_field: None,
      },
      resilience: ResilienceConfig::default(),
    }
  }

  fn adapter(items_path: Option<&str>) -> JsonApiAdapter {
    let proxy_manager = Arc::new(news_client::ProxyManager::new(Vec::new()));
    let runtime =
      Arc::new(FetchRuntime::new(news_client::FetchConfig::default(), proxy_manager).unwrap());
    JsonApiAdapter::new("site", "Site", config(items_path), runtime, 300)
  }

  #[test]
  fn test_parse_navigates_dot_path_and_maps_fields() {
    let body = serde_json::json!({
      "data": {
        "articles": [
          {"id": 42, "headline": "Big news", "link": "https://example.com/1",
           "published": "2026-07-28T10:00:00Z", "image": "https://example.com/i.png",
           "summary": "short"}
        ]
      }
    });
    let items = adapter(Some("data.articles")).parse(&body);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Big news");
    assert_eq!(items[0].url, "https://example.com/1");
    assert!(items[0].published_at.is_some());
    assert_eq!(items[0].summary.as_deref(), Some("short"));
  }

  #[test]
  fn test_id_falls_back_to_url_when_id_field_missing() {
    let mut cfg = config(None);
    cfg.fields.id_field = None;
    let runtime = {
      let proxy_manager = Arc::new(news_client::ProxyManager::new(Vec::new()));
      Arc::new(FetchRuntime::new(news_client::FetchConfig::default(), proxy_manager).unwrap())
    };
    let adapter = JsonApiAdapter::new("site", "Site", cfg, runtime, 300);
    let body = serde_json::json!([{"headline": "T", "link": "https://example.com/x"}]);
    let items = adapter.parse(&body);
    assert_eq!(items[0].id, news_core::id::from_url("site", "https://example.com/x"));
  }

  #[test]
  fn test_parse_skips_items_missing_required_fields() {
    let items = adapter(None).parse(&serde_json::json!([{"headline": "only a title"}]));
    assert!(items.is_empty());
  }
}
