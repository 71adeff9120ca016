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

//! Wires a full `Engine` from the catalog store DSN, the way a long-running
//! server process would; the CLI pays the same startup cost per invocation.

use crate::config::Config;
use anyhow::{Context, Result};
use news_client::{FetchConfig, FetchRuntime, ProxyManager};
use news_db::{
  DatabaseContext, DieselCacheRepository, DieselProxyRepository, DieselSourceCatalogRepository,
  DieselStatsRepository,
};
use news_engine::{Aggregator, CacheManager, Deduplicator, Engine, Scheduler, StatsCollector};
use std::sync::Arc;
use std::time::Duration;

const MEMORY_CACHE_CAPACITY: usize = 1024;
const FETCH_TIMEOUT_CEILING_SECS: u64 = 120;

pub async fn build_engine(config: &Config) -> Result<Engine> {
  let catalog_ctx = DatabaseContext::new(&config.core.database_url).context("connecting to the catalog store")?;
  let cache_ctx = DatabaseContext::new(&config.core.cache_url).context("connecting to the cache store")?;

  let catalog_repository = Arc::new(DieselSourceCatalogRepository::new(catalog_ctx.clone()));
  let cache_repository = Arc::new(DieselCacheRepository::new(cache_ctx));
  let stats_repository = Arc::new(DieselStatsRepository::new(catalog_ctx.clone()));
  let proxy_repository = Arc::new(DieselProxyRepository::new(catalog_ctx));

  let proxy_manager =
    Arc::new(ProxyManager::new(config.core.proxied_domains.clone()).with_repository(proxy_repository));
  proxy_manager.refresh_proxies().await?;

  let runtime = Arc::new(FetchRuntime::new(FetchConfig::default(), proxy_manager)?);

  let registry = Arc::new(news_engine::SourceRegistry::new(catalog_repository));

  let scheduler =
    Scheduler::new(config.core.worker_pool_size, true, Duration::from_secs(FETCH_TIMEOUT_CEILING_SECS));
  let cache = CacheManager::new(cache_repository, MEMORY_CACHE_CAPACITY);

  Ok(Engine::new(
    registry,
    scheduler,
    cache,
    Deduplicator::new(),
    Aggregator::new(),
    StatsCollector::new(Some(stats_repository)),
    runtime,
  ))
}
