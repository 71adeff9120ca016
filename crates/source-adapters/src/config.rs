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

//! Typed per-family configuration, replacing the duck-typed dynamic config
//! objects the original source used (§9 redesign flag).

use serde::{Deserialize, Serialize};

/// Shared across every family: retries, backups, fallback APIs, and the
/// opt-in synthetic-content escape hatch (§4.2 resilience features).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceConfig {
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  #[serde(default = "default_retry_base_delay_ms")]
  pub retry_base_delay_ms: u64,
  #[serde(default)]
  pub backup_urls: Vec<String>,
  #[serde(default)]
  pub fallback_apis: Vec<String>,
  #[serde(default)]
  pub synthetic_fallback: bool,
}

fn default_max_retries() -> u32 {
  3
}

fn default_retry_base_delay_ms() -> u64 {
  200
}

impl Default for ResilienceConfig {
  fn default() -> Self {
    Self {
      max_retries: default_max_retries(),
      retry_base_delay_ms: default_retry_base_delay_ms(),
      backup_urls: Vec::new(),
      fallback_apis: Vec::new(),
      synthetic_fallback: false,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlSelectors {
  pub item: String,
  pub title: String,
  pub url: String,
  #[serde(default)]
  pub timestamp: Option<String>,
  #[serde(default)]
  pub image: Option<String>,
  #[serde(default)]
  pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlAdapterConfig {
  pub url: String,
  pub base_url: String,
  pub selectors: HtmlSelectors,
  #[serde(flatten)]
  pub resilience: ResilienceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonFieldMap {
  #[serde(default)]
  pub id_field: Option<String>,
  pub title_field: String,
  pub url_field: String,
  #[serde(default)]
  pub date_field: Option<String>,
  #[serde(default)]
  pub date_format: Option<String>,
  #[serde(default)]
  pub image_field: Option<String>,
  #[serde(default)]
  pub summary_field: Option<String>,
  #[serde(default)]
  pub content_field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonApiAdapterConfig {
  pub url: String,
  /// Dot-separated path to the items array, e.g. `"data.articles"`.
  #[serde(default)]
  pub items_path: Option<String>,
  pub fields: JsonFieldMap,
  #[serde(flatten)]
  pub resilience: ResilienceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssAdapterConfig {
  pub url: String,
  #[serde(flatten)]
  pub resilience: ResilienceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserAdapterConfig {
  pub url: String,
  pub base_url: String,
  pub selectors: HtmlSelectors,
  #[serde(default = "default_window_width")]
  pub window_width: u32,
  #[serde(default = "default_window_height")]
  pub window_height: u32,
  #[serde(default = "default_wait_selector")]
  pub wait_selector: String,
  #[serde(default)]
  pub clear_cookies: bool,
  #[serde(default)]
  pub browser_binary: Option<String>,
  #[serde(flatten)]
  pub resilience: ResilienceConfig,
}

fn default_window_width() -> u32 {
  1920
}

fn default_window_height() -> u32 {
  1080
}

fn default_wait_selector() -> String {
  "body".to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_resilience_config_defaults() {
    let config = ResilienceConfig::default();
    assert_eq!(config.max_retries, 3);
    assert!(!config.synthetic_fallback);
    assert!(config.backup_urls.is_empty());
  }

  #[test]
  fn test_html_adapter_config_deserializes_with_flattened_resilience() {
    let json = serde_json::json!({
      "url": "https://example.com/news",
      "base_url": "https://example.com",
      "selectors": {
        "item": ".article",
        "title": ".title",
        "url": "a"
      },
      "synthetic_fallback": true
    });
    let config: HtmlAdapterConfig = serde_json::from_value(json).unwrap();
    assert_eq!(config.selectors.item, ".article");
    assert!(config.resilience.synthetic_fallback);
  }
}
