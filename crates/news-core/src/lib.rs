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

//! # news-core
//!
//! Core types, configuration, and error handling shared across every crate in
//! the news aggregation engine:
//!
//! - [`Config`] - engine-wide configuration (worker pool size, default intervals, proxied domains)
//! - [`Error`] and [`Result`] - unified error handling
//! - [`NewsItem`], [`Source`], [`SourceType`], [`SourceStatus`] - the shared domain model

pub mod cache;
pub mod config;
pub mod error;
pub mod id;
pub mod types;

pub use cache::{glob_match, CacheRepository, CacheRepositoryExt};
pub use config::Config;
pub use error::{Error, FetchError, FetchErrorKind, Result};
pub use types::{CacheEntry, NewsItem, Source, SourceStatus, SourceType};

/// Default per-source fetch interval when a source doesn't specify one.
pub const DEFAULT_UPDATE_INTERVAL_SECS: i32 = 600;

/// Default cache TTL when a source doesn't specify one.
pub const DEFAULT_CACHE_TTL_SECS: i32 = 300;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_update_interval_ge_default_cache_ttl() {
    assert!(DEFAULT_UPDATE_INTERVAL_SECS >= DEFAULT_CACHE_TTL_SECS);
  }
}
