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

//! Shared domain model: [`NewsItem`] and [`Source`], plus the small enums
//! that describe a source's family and lifecycle state.

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single normalized news record, immutable once constructed.
///
/// `id` is deterministic per (source, natural-key) — see [`crate::id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
  pub id: String,
  pub source_id: String,
  pub source_name: String,
  pub title: String,
  pub url: String,
  pub mobile_url: Option<String>,
  pub content: Option<String>,
  pub summary: Option<String>,
  pub image_url: Option<String>,
  pub published_at: Option<NaiveDateTime>,
  #[serde(default)]
  pub extra: HashMap<String, serde_json::Value>,
}

impl NewsItem {
  /// Validate the two required-non-empty fields per the data model invariants.
  /// Adapters call this right after building an item, before it ever leaves
  /// the adapter boundary.
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::MissingField("title".to_string()));
    }
    if self.url.trim().is_empty() {
      return Err(Error::MissingField("url".to_string()));
    }
    Ok(())
  }

  /// `mobile_url`, defaulting to `url` when unset.
  pub fn mobile_url_or_default(&self) -> &str {
    self.mobile_url.as_deref().unwrap_or(&self.url)
  }

  /// Set a source-specific extra field.
  pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
    self.extra.insert(key.into(), value.into());
    self
  }

  /// Whether this item is tagged as "top" by its source (`extra.is_top`).
  pub fn is_top(&self) -> bool {
    self.extra.get("is_top").and_then(|v| v.as_bool()).unwrap_or(false)
  }
}

/// The family an adapter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
  Html,
  Api,
  Rss,
  Browser,
  Mixed,
}

impl std::fmt::Display for SourceType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SourceType::Html => write!(f, "HTML"),
      SourceType::Api => write!(f, "API"),
      SourceType::Rss => write!(f, "RSS"),
      SourceType::Browser => write!(f, "BROWSER"),
      SourceType::Mixed => write!(f, "MIXED"),
    }
  }
}

impl SourceType {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.to_ascii_uppercase().as_str() {
      "HTML" => Some(SourceType::Html),
      "API" => Some(SourceType::Api),
      "RSS" => Some(SourceType::Rss),
      "BROWSER" => Some(SourceType::Browser),
      "MIXED" => Some(SourceType::Mixed),
      _ => None,
    }
  }
}

/// Lifecycle state of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceStatus {
  Active,
  Inactive,
  Error,
  Warning,
}

impl std::fmt::Display for SourceStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SourceStatus::Active => write!(f, "ACTIVE"),
      SourceStatus::Inactive => write!(f, "INACTIVE"),
      SourceStatus::Error => write!(f, "ERROR"),
      SourceStatus::Warning => write!(f, "WARNING"),
    }
  }
}

impl SourceStatus {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.to_ascii_uppercase().as_str() {
      "ACTIVE" => Some(SourceStatus::Active),
      "INACTIVE" => Some(SourceStatus::Inactive),
      "ERROR" => Some(SourceStatus::Error),
      "WARNING" => Some(SourceStatus::Warning),
      _ => None,
    }
  }
}

/// A catalog entry describing one news source.
///
/// Mutated only by catalog refresh (see `news-engine::Registry`); the
/// `update_interval_seconds >= cache_ttl_seconds >= 0` invariant is checked
/// by [`Source::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
  pub source_id: String,
  pub name: String,
  pub description: Option<String>,
  pub source_type: SourceType,
  pub category: Option<String>,
  pub country: Option<String>,
  pub language: Option<String>,
  pub update_interval_seconds: i32,
  pub cache_ttl_seconds: i32,
  pub status: SourceStatus,
  #[serde(default)]
  pub config: serde_json::Value,
  pub needs_proxy: bool,
  pub proxy_group: Option<String>,
  pub last_updated: Option<NaiveDateTime>,
  pub last_error: Option<String>,
  pub news_count: i32,
}

impl Source {
  pub fn validate(&self) -> Result<()> {
    if self.update_interval_seconds < self.cache_ttl_seconds {
      return Err(Error::Config(format!(
        "source {}: update_interval_seconds ({}) must be >= cache_ttl_seconds ({})",
        self.source_id, self.update_interval_seconds, self.cache_ttl_seconds
      )));
    }
    if self.cache_ttl_seconds < 0 {
      return Err(Error::Config(format!(
        "source {}: cache_ttl_seconds must be >= 0",
        self.source_id
      )));
    }
    Ok(())
  }

  pub fn cache_key(&self) -> String {
    format!("source:{}", self.source_id)
  }
}

/// An in-memory or remote cache entry holding one source's item list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
  pub key: String,
  pub value: Vec<NewsItem>,
  pub stored_at: NaiveDateTime,
}

impl CacheEntry {
  pub fn is_fresh(&self, now: NaiveDateTime, ttl_seconds: i64) -> bool {
    (now - self.stored_at).num_seconds() < ttl_seconds
  }
}
