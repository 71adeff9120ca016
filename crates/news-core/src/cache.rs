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

//! The object-safe seam over the remote cache tier (§4.4), mirrored on the
//! teacher's `CacheRepository`/`CacheRepositoryExt` split: the object-safe
//! trait works in `serde_json::Value`, and a blanket extension trait adds
//! the generic, typed `get`/`set` on top of it. Lives in `news-core` (not
//! `news-db`) so `news-engine`'s `CacheManager` can hold an
//! `Arc<dyn CacheRepository>` without depending on Diesel.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait CacheRepository: Send + Sync {
  async fn get_json(&self, key: &str) -> Result<Option<serde_json::Value>>;
  async fn set_json(&self, key: &str, value: serde_json::Value, ttl_seconds: i64) -> Result<()>;
  async fn delete(&self, key: &str) -> Result<bool>;
  async fn exists(&self, key: &str) -> Result<bool>;
  async fn ttl(&self, key: &str) -> Result<i64>;
  async fn cleanup_expired(&self) -> Result<usize>;
  /// Glob-style key deletion (§4.4 `clear(pattern)`).
  async fn clear_matching(&self, pattern: &str) -> Result<usize>;
}

pub trait CacheRepositoryExt: CacheRepository {
  async fn get<T>(&self, key: &str) -> Result<Option<T>>
  where
    T: for<'de> Deserialize<'de> + Send + 'static,
  {
    match self.get_json(key).await? {
      Some(json) => Ok(Some(serde_json::from_value(json)?)),
      None => Ok(None),
    }
  }

  async fn set<T>(&self, key: &str, value: &T, ttl_seconds: i64) -> Result<()>
  where
    T: Serialize + Send + Sync,
  {
    let json = serde_json::to_value(value)?;
    self.set_json(key, json, ttl_seconds).await
  }
}

impl<T: CacheRepository + ?Sized> CacheRepositoryExt for T {}

/// Matches a `fnmatch`-style glob (`*` and `?` only) against a key, used by
/// `clear_matching` implementations that scan rather than push the pattern
/// down to SQL `LIKE`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
  fn helper(p: &[u8], t: &[u8]) -> bool {
    match (p.first(), t.first()) {
      (None, None) => true,
      (Some(b'*'), _) => helper(&p[1..], t) || (!t.is_empty() && helper(p, &t[1..])),
      (Some(b'?'), Some(_)) => helper(&p[1..], &t[1..]),
      (Some(pc), Some(tc)) if pc == tc => helper(&p[1..], &t[1..]),
      _ => false,
    }
  }
  helper(pattern.as_bytes(), text.as_bytes())
}
