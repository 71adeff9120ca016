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

//! Two-tier cache (§4.4): an in-process bounded tier guarded by a single
//! `RwLock` (the teacher's per-key-lock idiom generalized to a whole map,
//! since this tier is small and short-lived relative to the Postgres tier)
//! in front of the remote `CacheRepository`-backed tier. Read order is
//! memory then remote, with remote hits populating memory; writes go to
//! both, deletes remove from both.

use chrono::{NaiveDateTime, Utc};
use news_core::{CacheRepository, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

struct MemoryEntry {
  value: serde_json::Value,
  stored_at: NaiveDateTime,
  ttl_seconds: i64,
}

impl MemoryEntry {
  fn is_fresh(&self, now: NaiveDateTime) -> bool {
    (now - self.stored_at).num_seconds() < self.ttl_seconds
  }
}

#[derive(Debug, Default)]
pub struct CacheStats {
  pub hits: u64,
  pub misses: u64,
  pub total_keys: usize,
}

pub struct CacheManager {
  remote: Arc<dyn CacheRepository>,
  memory: RwLock<HashMap<String, MemoryEntry>>,
  memory_capacity: usize,
  hits: AtomicU64,
  misses: AtomicU64,
}

impl CacheManager {
  pub fn new(remote: Arc<dyn CacheRepository>, memory_capacity: usize) -> Self {
    Self {
      remote,
      memory: RwLock::new(HashMap::new()),
      memory_capacity,
      hits: AtomicU64::new(0),
      misses: AtomicU64::new(0),
    }
  }

  pub async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
    let now = Utc::now().naive_utc();
    if let Some(value) = self.memory_get(key, now) {
      self.hits.fetch_add(1, Ordering::Relaxed);
      return Ok(Some(value));
    }

    match self.remote.get_json(key).await? {
      Some(value) => {
        self.hits.fetch_add(1, Ordering::Relaxed);
        let ttl = self.remote.ttl(key).await.unwrap_or(300).max(1);
        self.memory_set(key, value.clone(), ttl, now);
        Ok(Some(value))
      }
      None => {
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
      }
    }
  }

  pub async fn get_typed<T>(&self, key: &str) -> Result<Option<T>>
  where
    T: for<'de> serde::Deserialize<'de>,
  {
    match self.get(key).await? {
      Some(json) => Ok(Some(serde_json::from_value(json)?)),
      None => Ok(None),
    }
  }

  pub async fn set(&self, key: &str, value: serde_json::Value, ttl_seconds: i64) -> Result<()> {
    self.memory_set(key, value.clone(), ttl_seconds, Utc::now().naive_utc());
    self.remote.set_json(key, value, ttl_seconds).await
  }

  pub async fn set_typed<T>(&self, key: &str, value: &T, ttl_seconds: i64) -> Result<()>
  where
    T: serde::Serialize,
  {
    self.set(key, serde_json::to_value(value)?, ttl_seconds).await
  }

  pub async fn delete(&self, key: &str) -> Result<bool> {
    self.memory.write().unwrap().remove(key);
    self.remote.delete(key).await
  }

  pub async fn clear(&self, pattern: &str) -> Result<usize> {
    {
      let mut guard = self.memory.write().unwrap();
      let matching: Vec<String> =
        guard.keys().filter(|k| news_core::cache::glob_match(pattern, k)).cloned().collect();
      for key in matching {
        guard.remove(&key);
      }
    }
    self.remote.clear_matching(pattern).await
  }

  pub async fn exists(&self, key: &str) -> Result<bool> {
    if self.memory_get(key, Utc::now().naive_utc()).is_some() {
      return Ok(true);
    }
    self.remote.exists(key).await
  }

  pub async fn ttl(&self, key: &str) -> Result<i64> {
    self.remote.ttl(key).await
  }

  pub fn stats(&self) -> CacheStats {
    CacheStats {
      hits: self.hits.load(Ordering::Relaxed),
      misses: self.misses.load(Ordering::Relaxed),
      total_keys: self.memory.read().unwrap().len(),
    }
  }

  fn memory_get(&self, key: &str, now: NaiveDateTime) -> Option<serde_json::Value> {
    let guard = self.memory.read().unwrap();
    guard.get(key).filter(|entry| entry.is_fresh(now)).map(|entry| entry.value.clone())
  }

  fn memory_set(&self, key: &str, value: serde_json::Value, ttl_seconds: i64, now: NaiveDateTime) {
    let mut guard = self.memory.write().unwrap();
    if guard.len() >= self.memory_capacity && !guard.contains_key(key) {
      if let Some(oldest) = guard.iter().min_by_key(|(_, e)| e.stored_at).map(|(k, _)| k.clone()) {
        guard.remove(&oldest);
      }
    }
    guard.insert(key.to_string(), MemoryEntry { value, stored_at: now, ttl_seconds });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use std::sync::Mutex;

  struct FakeRepository {
    store: Mutex<HashMap<String, (serde_json::Value, i64)>>,
  }

  impl FakeRepository {
    fn new() -> Self {
      Self { store: Mutex::new(HashMap::new()) }
    }
  }

  #[async_trait]
  impl CacheRepository for FakeRepository {
    async fn get_json(&self, key: &str) -> Result<Option<serde_json::Value>> {
      Ok(self.store.lock().unwrap().get(key).map(|(v, _)| v.clone()))
    }
    async fn set_json(&self, key: &str, value: serde_json::Value, ttl_seconds: i64) -> Result<()> {
      self.store.lock().unwrap().insert(key.to_string(), (value, ttl_seconds));
      Ok(())
    }
    async fn delete(&self, key: &str) -> Result<bool> {
      Ok(self.store.lock().unwrap().remove(key).is_some())
    }
    async fn exists(&self, key: &str) -> Result<bool> {
      Ok(self.store.lock().unwrap().contains_key(key))
    }
    async fn ttl(&self, key: &str) -> Result<i64> {
      Ok(self.store.lock().unwrap().get(key).map(|(_, ttl)| *ttl).unwrap_or(-1))
    }
    async fn cleanup_expired(&self) -> Result<usize> {
      Ok(0)
    }
    async fn clear_matching(&self, pattern: &str) -> Result<usize> {
      let mut guard = self.store.lock().unwrap();
      let matching: Vec<String> =
        guard.keys().filter(|k| news_core::cache::glob_match(pattern, k)).cloned().collect();
      for key in &matching {
        guard.remove(key);
      }
      Ok(matching.len())
    }
  }

  fn manager() -> CacheManager {
    CacheManager::new(Arc::new(FakeRepository::new()), 16)
  }

  #[tokio::test]
  async fn test_set_then_get_hits_memory_tier() {
    let cache = manager();
    cache.set("source:a", serde_json::json!({"n": 1}), 300).await.unwrap();
    let value = cache.get("source:a").await.unwrap().unwrap();
    assert_eq!(value, serde_json::json!({"n": 1}));
    assert_eq!(cache.stats().hits, 1);
  }

  #[tokio::test]
  async fn test_get_miss_then_populated_by_remote() {
    let cache = manager();
    assert!(cache.get("missing").await.unwrap().is_none());
    assert_eq!(cache.stats().misses, 1);
  }

  #[tokio::test]
  async fn test_delete_removes_from_both_tiers() {
    let cache = manager();
    cache.set("k", serde_json::json!(1), 300).await.unwrap();
    cache.delete("k").await.unwrap();
    assert!(cache.get("k").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_clear_matches_glob_pattern() {
    let cache = manager();
    cache.set("source:a", serde_json::json!(1), 300).await.unwrap();
    cache.set("source:b", serde_json::json!(1), 300).await.unwrap();
    cache.set("http:x", serde_json::json!(1), 300).await.unwrap();
    let deleted = cache.clear("source:*").await.unwrap();
    assert_eq!(deleted, 2);
    assert!(cache.get("http:x").await.unwrap().is_some());
  }
}
