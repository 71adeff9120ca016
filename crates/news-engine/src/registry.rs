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

//! Materializes the source catalog and hands out adapter handles (§4.1).
//! Falls back to a compiled-in source list when the metadata store is
//! unreachable at startup, instead of failing the whole process.

use news_core::{Source, SourceStatus};
use news_db::SourceCatalogRepository;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Enforces the "never an unmapped ACTIVE source" invariant (§8.1): a row
/// whose `type`/`config` doesn't resolve to a compiled-in adapter factory is
/// logged and demoted to INACTIVE right here, rather than surfacing as a
/// `NoSuchAdapter` error the first time someone tries to fetch it.
fn mark_inactive_if_no_adapter(source: &mut Source) {
  if source.status == SourceStatus::Active && !source_adapters::has_adapter_factory(source) {
    warn!(source_id = %source.source_id, source_type = %source.source_type, "no adapter factory for source, marking INACTIVE");
    source.status = SourceStatus::Inactive;
  }
}

pub struct SourceRegistry {
  repository: Option<Arc<dyn SourceCatalogRepository>>,
  sources: RwLock<HashMap<String, Source>>,
  fallback_sources: Vec<Source>,
}

impl SourceRegistry {
  pub fn new(repository: Arc<dyn SourceCatalogRepository>) -> Self {
    Self { repository: Some(repository), sources: RwLock::new(HashMap::new()), fallback_sources: Vec::new() }
  }

  /// Builds a registry with no metadata store, seeded directly from a
  /// compiled-in source list — the Registry's "local fallback mode".
  pub fn with_fallback_sources(fallback_sources: Vec<Source>) -> Self {
    let sources = fallback_sources.iter().map(|s| (s.source_id.clone(), s.clone())).collect();
    Self { repository: None, sources: RwLock::new(sources), fallback_sources }
  }

  pub async fn load_catalog(&self) -> news_core::Result<()> {
    let Some(repository) = &self.repository else {
      info!("no metadata store configured, using {} fallback sources", self.fallback_sources.len());
      return Ok(());
    };

    match repository.list_all().await {
      Ok(rows) => {
        let mut guard = self.sources.write().unwrap();
        guard.clear();
        for mut source in rows {
          mark_inactive_if_no_adapter(&mut source);
          guard.insert(source.source_id.clone(), source);
        }
        info!("loaded {} sources from catalog", guard.len());
        Ok(())
      }
      Err(e) => {
        warn!("catalog store unreachable ({e}), falling back to compiled-in sources");
        let mut guard = self.sources.write().unwrap();
        guard.clear();
        for source in &self.fallback_sources {
          guard.insert(source.source_id.clone(), source.clone());
        }
        Ok(())
      }
    }
  }

  /// Re-reads the store and diffs against the current registry: new sources
  /// are added, changed metadata is updated, removed sources are marked
  /// INACTIVE but keep their cache entry. No-op in local fallback mode.
  pub async fn refresh_catalog(&self) -> news_core::Result<()> {
    let Some(repository) = &self.repository else {
      return Ok(());
    };

    let mut fresh = repository.list_all().await?;
    let mut guard = self.sources.write().unwrap();
    let fresh_ids: std::collections::HashSet<_> = fresh.iter().map(|s| s.source_id.clone()).collect();

    for (id, existing) in guard.iter_mut() {
      if !fresh_ids.contains(id) {
        existing.status = SourceStatus::Inactive;
      }
    }
    for mut source in fresh.drain(..) {
      mark_inactive_if_no_adapter(&mut source);
      guard.insert(source.source_id.clone(), source);
    }
    Ok(())
  }

  pub fn get(&self, source_id: &str) -> Option<Source> {
    self.sources.read().unwrap().get(source_id).cloned()
  }

  pub fn all(&self) -> Vec<Source> {
    self.sources.read().unwrap().values().cloned().collect()
  }

  pub fn by_category(&self, category: &str) -> Vec<Source> {
    self.all().into_iter().filter(|s| s.category.as_deref() == Some(category)).collect()
  }

  pub fn by_country(&self, country: &str) -> Vec<Source> {
    self.all().into_iter().filter(|s| s.country.as_deref() == Some(country)).collect()
  }

  pub fn by_language(&self, language: &str) -> Vec<Source> {
    self.all().into_iter().filter(|s| s.language.as_deref() == Some(language)).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use news_core::SourceType;

  fn source(id: &str, category: &str) -> Source {
    Source {
      source_id: id.to_string(),
      name: id.to_string(),
      description: None,
      source_type: SourceType::Rss,
      category: Some(category.to_string()),
      country: Some("us".to_string()),
      language: Some("en".to_string()),
      update_interval_seconds: 600,
      cache_ttl_seconds: 300,
      status: SourceStatus::Active,
      config: serde_json::json!({}),
      needs_proxy: false,
      proxy_group: None,
      last_updated: None,
      last_error: None,
      news_count: 0,
    }
  }

  #[tokio::test]
  async fn test_fallback_mode_seeds_sources_without_store() {
    let registry = SourceRegistry::with_fallback_sources(vec![source("a", "tech")]);
    registry.load_catalog().await.unwrap();
    assert!(registry.get("a").is_some());
  }

  #[tokio::test]
  async fn test_by_category_filters() {
    let registry = SourceRegistry::with_fallback_sources(vec![source("a", "tech"), source("b", "sports")]);
    registry.load_catalog().await.unwrap();
    assert_eq!(registry.by_category("tech").len(), 1);
  }

  #[tokio::test]
  async fn test_refresh_is_noop_in_fallback_mode() {
    let registry = SourceRegistry::with_fallback_sources(vec![source("a", "tech")]);
    registry.load_catalog().await.unwrap();
    registry.refresh_catalog().await.unwrap();
    assert_eq!(registry.all().len(), 1);
  }

  struct FakeCatalogRepository {
    rows: Vec<Source>,
  }

  #[async_trait::async_trait]
  impl news_db::SourceCatalogRepository for FakeCatalogRepository {
    async fn list_all(&self) -> news_core::Result<Vec<Source>> {
      Ok(self.rows.clone())
    }
    async fn get(&self, source_id: &str) -> news_core::Result<Option<Source>> {
      Ok(self.rows.iter().find(|s| s.source_id == source_id).cloned())
    }
    async fn list_by_category(&self, _category: &str) -> news_core::Result<Vec<Source>> {
      Ok(Vec::new())
    }
    async fn list_by_country(&self, _country: &str) -> news_core::Result<Vec<Source>> {
      Ok(Vec::new())
    }
    async fn list_by_language(&self, _language: &str) -> news_core::Result<Vec<Source>> {
      Ok(Vec::new())
    }
    async fn record_fetch_outcome(
      &self,
      _source_id: &str,
      _items_fetched: usize,
      _error: Option<&str>,
    ) -> news_core::Result<()> {
      Ok(())
    }
  }

  #[tokio::test]
  async fn test_load_catalog_marks_source_without_adapter_factory_inactive() {
    let mut no_adapter = source("d", "tech");
    no_adapter.config = serde_json::json!({}); // missing required `url` for the RSS family
    let repository = Arc::new(FakeCatalogRepository { rows: vec![no_adapter] });
    let registry = SourceRegistry::new(repository);
    registry.load_catalog().await.unwrap();
    assert_eq!(registry.get("d").unwrap().status, SourceStatus::Inactive);
  }

  #[tokio::test]
  async fn test_load_catalog_keeps_source_with_valid_adapter_config_active() {
    let mut has_adapter = source("e", "tech");
    has_adapter.config = serde_json::json!({"url": "https://example.com/feed.xml"});
    let repository = Arc::new(FakeCatalogRepository { rows: vec![has_adapter] });
    let registry = SourceRegistry::new(repository);
    registry.load_catalog().await.unwrap();
    assert_eq!(registry.get("e").unwrap().status, SourceStatus::Active);
  }
}
