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

//! The per-source fetch contract (§4.2) and the cache/single-flight core
//! every family shares.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use news_core::{Error, NewsItem, Result};
use std::future::Future;
use tokio::sync::{broadcast, Mutex};

#[async_trait]
pub trait SourceAdapter: Send + Sync {
  /// Return the source's items. With `force=false` and a fresh adapter
  /// cache, returns the cached items without network I/O.
  async fn fetch(&self, force: bool) -> Result<Vec<NewsItem>>;

  /// Atomically resets the cached item list and the last-fetch timestamp
  /// (§4.2's "critical invariant": never drift two separate fields).
  async fn clear_cache(&self);

  fn source_id(&self) -> &str;
}

struct CacheState {
  items: Vec<NewsItem>,
  fetched_at: Option<NaiveDateTime>,
}

/// Broadcast to followers what the leader of an in-flight fetch observed.
/// `Error` isn't `Clone` (it wraps library error types that aren't), so a
/// follower that joins a failed fetch gets an equivalent `Unexpected`
/// carrying the leader's message rather than the original typed error —
/// the leader's own caller still sees the real error.
#[derive(Clone)]
enum FetchOutcome {
  Items(Vec<NewsItem>),
  Failed(String),
}

enum Inflight {
  Idle,
  Running(broadcast::Sender<FetchOutcome>),
}

/// The single unified cache + single-flight guard backing every adapter
/// family (§4.2's "critical invariant" and §4.5's force-refresh
/// coalescing). Two mechanisms cooperate:
///
/// - `force=false`: holding `state`'s mutex across the whole
///   fetch-and-update sequence is enough — a second caller blocks on the
///   lock, and by the time it acquires it the freshness check above sees
///   the cache the first caller just populated.
/// - `force=true`: freshness doesn't apply, so a second caller would
///   otherwise always re-fetch. `inflight` tracks whether a fetch is
///   already underway; a caller that finds one running subscribes to its
///   outcome instead of starting a second network request, exactly the
///   "caller joins it and receives the same result" contract in §4.5.
pub struct AdapterCore {
  cache_ttl_seconds: i64,
  state: Mutex<CacheState>,
  inflight: Mutex<Inflight>,
}

impl AdapterCore {
  pub fn new(cache_ttl_seconds: i64) -> Self {
    Self {
      cache_ttl_seconds,
      state: Mutex::new(CacheState { items: Vec::new(), fetched_at: None }),
      inflight: Mutex::new(Inflight::Idle),
    }
  }

  /// Drives the cache-or-fetch decision. `do_fetch` performs the network
  /// fetch and parse; on `Err` the previous cached items (if any) are
  /// returned instead of propagating, matching the "parse/fetch failure
  /// falls back to last known good" contract — callers that want a hard
  /// failure when there is no cache still see the original error.
  pub async fn fetch_with<F, Fut>(&self, force: bool, do_fetch: F) -> Result<Vec<NewsItem>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<NewsItem>>>,
  {
    if !force {
      let guard = self.state.lock().await;
      if let Some(fetched_at) = guard.fetched_at {
        let age = Utc::now().naive_utc() - fetched_at;
        if age.num_seconds() < self.cache_ttl_seconds {
          return Ok(guard.items.clone());
        }
      }
      drop(guard);
    }

    // Join an in-flight fetch (if any) rather than starting a second one.
    // Subscribing while still holding `inflight`'s lock is what makes this
    // race-free: the leader can only transition back to `Idle` (and then
    // send) after acquiring the same lock, which it cannot do until this
    // follower has subscribed and released it.
    let leader_tx = {
      let mut inflight = self.inflight.lock().await;
      match &*inflight {
        Inflight::Running(tx) => {
          let mut rx = tx.subscribe();
          drop(inflight);
          return match rx.recv().await {
            Ok(FetchOutcome::Items(items)) => Ok(items),
            Ok(FetchOutcome::Failed(message)) => Err(Error::Unexpected(message)),
            Err(_) => Err(Error::Unexpected("in-flight fetch ended without a result".to_string())),
          };
        }
        Inflight::Idle => {
          let (tx, _rx) = broadcast::channel(1);
          *inflight = Inflight::Running(tx.clone());
          tx
        }
      }
    };

    let outcome = do_fetch().await;

    {
      let mut inflight = self.inflight.lock().await;
      *inflight = Inflight::Idle;
    }

    match outcome {
      Ok(items) => {
        let mut guard = self.state.lock().await;
        guard.items = items.clone();
        guard.fetched_at = Some(Utc::now().naive_utc());
        drop(guard);
        let _ = leader_tx.send(FetchOutcome::Items(items.clone()));
        Ok(items)
      }
      Err(e) => {
        let guard = self.state.lock().await;
        let cached = if guard.items.is_empty() { None } else { Some(guard.items.clone()) };
        drop(guard);
        match cached {
          Some(items) => {
            let _ = leader_tx.send(FetchOutcome::Items(items.clone()));
            Ok(items)
          }
          None => {
            let _ = leader_tx.send(FetchOutcome::Failed(e.to_string()));
            Err(e)
          }
        }
      }
    }
  }

  pub async fn clear(&self) {
    let mut guard = self.state.lock().await;
    guard.items = Vec::new();
    guard.fetched_at = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use news_core::Error;

  fn item(title: &str) -> NewsItem {
    NewsItem {
      id: "1".to_string(),
      source_id: "s".to_string(),
      source_name: "s".to_string(),
      title: title.to_string(),
      url: "http://x/1".to_string(),
      mobile_url: None,
      content: None,
      summary: None,
      image_url: None,
      published_at: None,
      extra: Default::default(),
    }
  }

  #[tokio::test]
  async fn test_fetch_with_caches_fresh_result() {
    let core = AdapterCore::new(300);
    let calls = std::sync::atomic::AtomicUsize::new(0);
    for _ in 0..3 {
      let result = core
        .fetch_with(false, || async {
          calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
          Ok(vec![item("a")])
        })
        .await
        .unwrap();
      assert_eq!(result.len(), 1);
    }
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_fetch_with_force_bypasses_cache() {
    let core = AdapterCore::new(300);
    core.fetch_with(false, || async { Ok(vec![item("a")]) }).await.unwrap();
    let result = core.fetch_with(true, || async { Ok(vec![item("b")]) }).await.unwrap();
    assert_eq!(result[0].title, "b");
  }

  #[tokio::test]
  async fn test_fetch_with_falls_back_to_cache_on_error() {
    let core = AdapterCore::new(0);
    core.fetch_with(false, || async { Ok(vec![item("a")]) }).await.unwrap();
    let result = core
      .fetch_with(true, || async { Err(Error::Unexpected("boom".to_string())) })
      .await
      .unwrap();
    assert_eq!(result[0].title, "a");
  }

  #[tokio::test]
  async fn test_fetch_with_propagates_error_without_cache() {
    let core = AdapterCore::new(300);
    let err = core
      .fetch_with(false, || async { Err(Error::Unexpected("boom".to_string())) })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Unexpected(_)));
  }

  #[tokio::test]
  async fn test_clear_resets_both_fields_atomically() {
    let core = AdapterCore::new(300);
    core.fetch_with(false, || async { Ok(vec![item("a")]) }).await.unwrap();
    core.clear().await;
    let guard = core.state.lock().await;
    assert!(guard.items.is_empty());
    assert!(guard.fetched_at.is_none());
  }

  #[tokio::test]
  async fn test_concurrent_force_refresh_collapses_to_one_call() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let core = Arc::new(AdapterCore::new(300));
    let calls = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..5 {
      let core = core.clone();
      let calls = calls.clone();
      handles.push(tokio::spawn(async move {
        core
          .fetch_with(true, || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(vec![item("a")])
          })
          .await
      }));
    }

    let mut results = Vec::new();
    for handle in handles {
      results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1, "only the leader should touch the network");
    for result in results {
      assert_eq!(result.len(), 1);
      assert_eq!(result[0].title, "a");
    }
  }

  #[tokio::test]
  async fn test_concurrent_force_refresh_followers_see_leader_error() {
    let core = std::sync::Arc::new(AdapterCore::new(300));

    let leader = {
      let core = core.clone();
      tokio::spawn(async move {
        core
          .fetch_with(true, || async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Err(Error::Unexpected("boom".to_string()))
          })
          .await
      })
    };
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let follower = {
      let core = core.clone();
      tokio::spawn(async move { core.fetch_with(true, || async { unreachable!("follower must not fetch") }).await })
    };

    assert!(matches!(leader.await.unwrap(), Err(Error::Unexpected(_))));
    assert!(matches!(follower.await.unwrap(), Err(Error::Unexpected(_))));
  }
}
