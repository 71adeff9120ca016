/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-dot-]browne[-at-]dwightjbrowne[-dot-]com
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

use crate::error::{Error, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;

/// Engine-wide configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
  /// Catalog store DSN (Postgres).
  pub database_url: String,

  /// Remote cache-tier DSN; defaults to `database_url` (see `NEWS_CACHE_URL`).
  pub cache_url: String,

  /// Size of the scheduler's worker pool.
  pub worker_pool_size: usize,

  /// Fallback `update_interval_seconds` for sources that don't specify one.
  pub default_update_interval_secs: i32,

  /// Fallback `cache_ttl_seconds` for sources that don't specify one.
  pub default_cache_ttl_secs: i32,

  /// Hosts that must be routed through a proxy regardless of per-source config.
  pub proxied_domains: Vec<String>,

  /// Display-only timezone; storage always stays UTC-naive.
  pub timezone: String,
}

impl Config {
  /// Load configuration from environment variables.
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let database_url =
      env::var("DATABASE_URL").map_err(|_| Error::Config("DATABASE_URL not set".to_string()))?;

    let cache_url = env::var("NEWS_CACHE_URL").unwrap_or_else(|_| database_url.clone());

    let worker_pool_size = env::var("NEWS_WORKER_POOL_SIZE")
      .ok()
      .and_then(|v| v.parse().ok())
      .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4) * 4);

    let default_update_interval_secs = env::var("NEWS_DEFAULT_UPDATE_INTERVAL_SECS")
      .unwrap_or_else(|_| crate::DEFAULT_UPDATE_INTERVAL_SECS.to_string())
      .parse()
      .map_err(|_| Error::Config("invalid NEWS_DEFAULT_UPDATE_INTERVAL_SECS".to_string()))?;

    let default_cache_ttl_secs = env::var("NEWS_DEFAULT_CACHE_TTL_SECS")
      .unwrap_or_else(|_| crate::DEFAULT_CACHE_TTL_SECS.to_string())
      .parse()
      .map_err(|_| Error::Config("invalid NEWS_DEFAULT_CACHE_TTL_SECS".to_string()))?;

    let proxied_domains = env::var("NEWS_PROXIED_DOMAINS")
      .unwrap_or_default()
      .split(',')
      .map(|s| s.trim().to_string())
      .filter(|s| !s.is_empty())
      .collect();

    let timezone = env::var("NEWS_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());

    if default_update_interval_secs < default_cache_ttl_secs {
      return Err(Error::Config(
        "NEWS_DEFAULT_UPDATE_INTERVAL_SECS must be >= NEWS_DEFAULT_CACHE_TTL_SECS".to_string(),
      ));
    }

    Ok(Config {
      database_url,
      cache_url,
      worker_pool_size,
      default_update_interval_secs,
      default_cache_ttl_secs,
      proxied_domains,
      timezone,
    })
  }

  /// Build a config with sane defaults (for testing).
  pub fn default_with_database_url(database_url: String) -> Self {
    Config {
      cache_url: database_url.clone(),
      database_url,
      worker_pool_size: 16,
      default_update_interval_secs: crate::DEFAULT_UPDATE_INTERVAL_SECS,
      default_cache_ttl_secs: crate::DEFAULT_CACHE_TTL_SECS,
      proxied_domains: Vec::new(),
      timezone: "UTC".to_string(),
    }
  }
}
