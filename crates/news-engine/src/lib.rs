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

//! # news-engine
//!
//! Wires the catalog, the adapters, the cache, the scheduler, the
//! deduplicator, the aggregator, and the stats collector into a single
//! fetch pipeline:
//!
//! registry lookup -> adapter build (cached per source) -> scheduler-gated
//! fetch (stats-wrapped) -> cache store (complete per-source list) -> dedup
//! -> aggregator ingest
//!
//! Reading the hot list, searching, or inspecting the cache all happen
//! against the in-process state the pipeline already built up; they don't
//! re-fetch anything.

pub mod aggregator;
pub mod cache;
pub mod dedup;
pub mod registry;
pub mod scheduler;
pub mod stats;

pub use aggregator::{Aggregator, Cluster, ClusterView};
pub use cache::{CacheManager, CacheStats};
pub use dedup::Deduplicator;
pub use registry::SourceRegistry;
pub use scheduler::{Scheduler, SourceStatus as SchedulerStatus, adaptive_interval};
pub use stats::{ApiType, StatsCollector};

use news_client::FetchRuntime;
use news_core::{Error, NewsItem, Result};
use source_adapters::SourceAdapter;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// Ties the engine's pieces together behind the operations an outer surface
/// (CLI, HTTP) actually needs, per the fetch pipeline above.
pub struct Engine {
  pub registry: Arc<SourceRegistry>,
  pub scheduler: Scheduler,
  pub cache: CacheManager,
  pub dedup: Deduplicator,
  pub aggregator: Aggregator,
  pub stats: StatsCollector,
  runtime: Arc<FetchRuntime>,
  /// One [`SourceAdapter`] instance per source, built lazily and kept for
  /// the engine's lifetime. §4.2's per-instance cache and §4.5's
  /// single-flight coalescing both live inside the adapter's `AdapterCore`,
  /// so two concurrent `fetch_source` calls for the same source only
  /// actually share that state — and so only ever make one network
  /// request between them — if they're handed the same adapter instance
  /// rather than a freshly built one each time.
  adapters: AsyncMutex<HashMap<String, Arc<dyn SourceAdapter>>>,
}

impl Engine {
  pub fn new(
    registry: Arc<SourceRegistry>,
    scheduler: Scheduler,
    cache: CacheManager,
    dedup: Deduplicator,
    aggregator: Aggregator,
    stats: StatsCollector,
    runtime: Arc<FetchRuntime>,
  ) -> Self {
    Self { registry, scheduler, cache, dedup, aggregator, stats, runtime, adapters: AsyncMutex::new(HashMap::new()) }
  }

  /// Returns the cached adapter for `source_id`, building and caching one
  /// if this is the first call for it. Holding the map's lock only for the
  /// lookup-or-insert (never across the fetch itself) keeps concurrent
  /// `fetch_source` calls for different sources from blocking each other.
  async fn adapter_for(&self, source: &news_core::Source) -> Result<Arc<dyn SourceAdapter>> {
    let mut adapters = self.adapters.lock().await;
    if let Some(adapter) = adapters.get(&source.source_id) {
      return Ok(adapter.clone());
    }
    let adapter: Arc<dyn SourceAdapter> =
      source_adapters::build_adapter(source, self.runtime.clone())
        .ok_or_else(|| Error::NoSuchAdapter(source.source_id.clone()))?
        .into();
    adapters.insert(source.source_id.clone(), adapter.clone());
    Ok(adapter)
  }

  /// Loads the catalog from the metadata store (or seeds the compiled-in
  /// fallback list if none is configured).
  pub async fn load_catalog(&self) -> Result<()> {
    self.registry.load_catalog().await
  }

  /// Re-reads the catalog store and drops every cached adapter instance, so
  /// a source whose `config_json` changed (new URL, new selectors, ...)
  /// gets rebuilt against the new config on its next fetch instead of
  /// going on serving the stale one out of the adapter cache.
  pub async fn refresh_catalog(&self) -> Result<()> {
    self.registry.refresh_catalog().await?;
    self.adapters.lock().await.clear();
    Ok(())
  }

  /// Runs the full pipeline for a single source: build its adapter, fetch
  /// through the scheduler (stats-wrapped), store the complete result under
  /// the source's cache key, then feed the non-duplicate subset to the
  /// aggregator. Returns the source's complete item list as fetched;
  /// the per-source cache entry holds the same complete list (§4.6: dedup
  /// "does not modify cached per-source lists") — only the Aggregator's
  /// cross-source view is filtered through the Deduplicator.
  pub async fn fetch_source(&self, source_id: &str, force: bool) -> Result<Vec<NewsItem>> {
    let source = self.registry.get(source_id).ok_or_else(|| Error::NoSuchSource(source_id.to_string()))?;
    let adapter = self.adapter_for(&source).await?;

    let update_interval_secs = i64::from(source.update_interval_seconds);
    let scheduler = &self.scheduler;
    let items = self
      .stats
      .wrap_fetch(source_id, ApiType::Internal, || async {
        scheduler.fetch_source_items(adapter.as_ref(), force, update_interval_secs).await
      })
      .await?;

    self.cache.set(&source.cache_key(), serde_json::to_value(&items)?, i64::from(source.cache_ttl_seconds)).await?;

    let fresh: Vec<NewsItem> = items.iter().cloned().filter(|item| !self.dedup.is_duplicate(item)).collect();
    self.aggregator.add_batch(fresh);

    Ok(items)
  }

  /// Runs `fetch_source` for every catalog entry, concurrency-bounded by the
  /// scheduler's own semaphore (each call still acquires a permit). A
  /// per-source failure doesn't stop the rest; failures are reported
  /// alongside the successes.
  pub async fn fetch_all(&self, force: bool) -> Vec<(String, Result<Vec<NewsItem>>)> {
    use futures::stream::{self, StreamExt};

    let sources = self.registry.all();
    stream::iter(sources)
      .map(|source| async move {
        let result = self.fetch_source(&source.source_id, force).await;
        (source.source_id, result)
      })
      .buffer_unordered(sources_concurrency(&self.scheduler))
      .collect()
      .await
  }

  pub fn hot(&self, limit: usize) -> Vec<ClusterView> {
    self.aggregator.hot(limit)
  }

  pub fn by_category(&self, category: &str, limit: usize) -> Vec<ClusterView> {
    self.aggregator.by_category(category, limit)
  }

  pub fn search(&self, query: &str, max_results: usize) -> Vec<NewsItem> {
    self.aggregator.search(query, max_results)
  }

  pub async fn cache_get(&self, key: &str) -> Result<Option<serde_json::Value>> {
    self.cache.get(key).await
  }

  pub async fn cache_clear(&self, pattern: &str) -> Result<usize> {
    self.cache.clear(pattern).await
  }

  pub fn cache_stats(&self) -> CacheStats {
    self.cache.stats()
  }

  pub async fn flush_stats(&self) {
    self.stats.flush_all().await
  }
}

/// `fetch_all`'s own in-flight cap; kept modest and independent of the
/// scheduler's semaphore permit count so a narrow scheduler doesn't leave
/// `buffer_unordered` building a giant pending-future queue.
fn sources_concurrency(_scheduler: &Scheduler) -> usize {
  8
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use news_core::{Source, SourceStatus as CatalogStatus, SourceType};
  use news_db::StatsRepository;
  use std::time::Duration;

  fn source(id: &str) -> Source {
    Source {
      source_id: id.to_string(),
      name: id.to_string(),
      description: None,
      source_type: SourceType::Rss,
      category: Some("world".to_string()),
      country: Some("us".to_string()),
      language: Some("en".to_string()),
      update_interval_seconds: 600,
      cache_ttl_seconds: 300,
      status: CatalogStatus::Active,
      config: serde_json::json!({"url": "https://example.com/feed.xml"}),
      needs_proxy: false,
      proxy_group: None,
      last_updated: None,
      last_error: None,
      news_count: 0,
    }
  }

  struct NullCacheRepository;

  #[async_trait]
  impl news_core::CacheRepository for NullCacheRepository {
    async fn get_json(&self, _key: &str) -> Result<Option<serde_json::Value>> {
      Ok(None)
    }
    async fn set_json(&self, _key: &str, _value: serde_json::Value, _ttl_seconds: i64) -> Result<()> {
      Ok(())
    }
    async fn delete(&self, _key: &str) -> Result<bool> {
      Ok(false)
    }
    async fn exists(&self, _key: &str) -> Result<bool> {
      Ok(false)
    }
    async fn ttl(&self, _key: &str) -> Result<i64> {
      Ok(-1)
    }
    async fn cleanup_expired(&self) -> Result<usize> {
      Ok(0)
    }
    async fn clear_matching(&self, _pattern: &str) -> Result<usize> {
      Ok(0)
    }
  }

  struct NullStatsRepository;

  #[async_trait]
  impl StatsRepository for NullStatsRepository {
    async fn append(&self, _delta: news_db::StatsDelta) -> Result<()> {
      Ok(())
    }
    async fn append_batch(&self, _deltas: Vec<news_db::StatsDelta>) -> Result<()> {
      Ok(())
    }
  }

  fn engine() -> Engine {
    let registry = Arc::new(SourceRegistry::with_fallback_sources(vec![source("bbc")]));
    let proxy_manager = Arc::new(news_client::ProxyManager::new(Vec::new()));
    let runtime =
      Arc::new(FetchRuntime::new(news_client::FetchConfig::default(), proxy_manager).unwrap());
    Engine::new(
      registry,
      Scheduler::new(4, true, Duration::from_secs(30)),
      CacheManager::new(Arc::new(NullCacheRepository), 64),
      Deduplicator::new(),
      Aggregator::new(),
      StatsCollector::new(Some(Arc::new(NullStatsRepository))),
      runtime,
    )
  }

  #[tokio::test]
  async fn test_fetch_source_errors_for_unknown_source() {
    let engine = engine();
    let result = engine.fetch_source("missing", false).await;
    assert!(matches!(result, Err(Error::NoSuchSource(_))));
  }

  /// The adapter cache is what makes single-flight coalescing (§4.5) and the
  /// adapter's own freshness cache (§4.2) work across separate
  /// `fetch_source` calls at all — a fresh adapter every call would mean a
  /// fresh, always-empty `AdapterCore` every call.
  #[tokio::test]
  async fn test_adapter_for_reuses_the_same_instance_across_calls() {
    let engine = engine();
    let src = source("bbc");
    let first = engine.adapter_for(&src).await.unwrap();
    let second = engine.adapter_for(&src).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
  }

  #[tokio::test]
  async fn test_refresh_catalog_drops_cached_adapters() {
    let engine = engine();
    let src = source("bbc");
    let before = engine.adapter_for(&src).await.unwrap();
    engine.refresh_catalog().await.unwrap();
    let after = engine.adapter_for(&src).await.unwrap();
    assert!(!Arc::ptr_eq(&before, &after), "refresh should rebuild rather than reuse a stale adapter");
  }

  #[tokio::test]
  async fn test_hot_and_search_start_empty() {
    let engine = engine();
    assert!(engine.hot(10).is_empty());
    assert!(engine.search("anything", 10).is_empty());
  }

  #[tokio::test]
  async fn test_cache_stats_start_at_zero() {
    let engine = engine();
    let stats = engine.cache_stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 0);
  }

  #[test]
  fn test_registry_is_reachable_from_engine() {
    let engine = engine();
    assert!(engine.registry.get("bbc").is_some());
  }
}
