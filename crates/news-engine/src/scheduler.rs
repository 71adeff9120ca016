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

//! Drives per-source fetches on a timeline (§4.5): a bounded worker pool
//! (`tokio::sync::Semaphore`, the batch processor's idiom) caps global
//! concurrency, a per-source `tokio::sync::Mutex` enforces single-flight on
//! top of the adapter's own single-flight guard, and an adaptive interval
//! stretches the gap after failures and shrinks it for active sources.

use chrono::{NaiveDateTime, Utc};
use source_adapters::SourceAdapter;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tracing::{info, warn};

const K_FAIL: f64 = 0.5;
const K_ACTIVITY: f64 = 0.3;
const ACTIVITY_CAP: f64 = 20.0;
const MIN_INTERVAL_SECS: i64 = 60;
const MAX_INTERVAL_SECS: i64 = 24 * 3600;

#[derive(Debug, Clone, Default)]
pub struct SourceStatus {
  pub last_success: Option<NaiveDateTime>,
  pub last_error: Option<String>,
  pub next_due: Option<NaiveDateTime>,
  pub consecutive_failures: u32,
  pub recent_news_counts: Vec<usize>,
}

impl SourceStatus {
  fn normalized_activity(&self) -> f64 {
    let recent_max = self.recent_news_counts.iter().copied().max().unwrap_or(0) as f64;
    (recent_max.min(ACTIVITY_CAP)) / ACTIVITY_CAP
  }

  fn record_news_count(&mut self, count: usize) {
    self.recent_news_counts.push(count);
    if self.recent_news_counts.len() > 5 {
      self.recent_news_counts.remove(0);
    }
  }
}

/// Computes the adaptive next-interval (§4.5): `clamp(base * (1 + k_fail *
/// consecutive_failures) * (1 - k_activity * normalized_activity), min, max)`.
pub fn adaptive_interval(base_interval_secs: i64, status: &SourceStatus) -> i64 {
  let failure_multiplier = 1.0 + K_FAIL * status.consecutive_failures as f64;
  let activity_multiplier = 1.0 - K_ACTIVITY * status.normalized_activity();
  let interval = base_interval_secs as f64 * failure_multiplier * activity_multiplier;
  (interval.round() as i64).clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS)
}

pub struct Scheduler {
  semaphore: Arc<Semaphore>,
  per_source_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
  statuses: Mutex<HashMap<String, SourceStatus>>,
  adaptive: bool,
  fetch_timeout_ceiling: Duration,
}

impl Scheduler {
  pub fn new(max_concurrent_fetches: usize, adaptive: bool, fetch_timeout_ceiling: Duration) -> Self {
    Self {
      semaphore: Arc::new(Semaphore::new(max_concurrent_fetches)),
      per_source_locks: Mutex::new(HashMap::new()),
      statuses: Mutex::new(HashMap::new()),
      adaptive,
      fetch_timeout_ceiling,
    }
  }

  async fn lock_for(&self, source_id: &str) -> Arc<Mutex<()>> {
    let mut guard = self.per_source_locks.lock().await;
    guard.entry(source_id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
  }

  /// Runs a single source's fetch under the global semaphore and the
  /// per-source single-flight lock, applying a deadline no longer than
  /// `update_interval_secs` (or the configured ceiling, whichever is
  /// smaller). Updates the source's status regardless of outcome. Returns
  /// `true` on success; callers that need the items themselves (the `Engine`
  /// facade, surfacing results to an HTTP caller) should use
  /// [`Scheduler::fetch_source_items`] instead.
  pub async fn fetch_source(
    &self,
    adapter: &dyn SourceAdapter,
    force: bool,
    update_interval_secs: i64,
  ) -> bool {
    self.fetch_source_items(adapter, force, update_interval_secs).await.is_ok()
  }

  /// Same gating (global semaphore, per-source single-flight mutex, deadline)
  /// as [`Scheduler::fetch_source`], but surfaces the fetched items (or the
  /// error) instead of collapsing the outcome to a bool.
  pub async fn fetch_source_items(
    &self,
    adapter: &dyn SourceAdapter,
    force: bool,
    update_interval_secs: i64,
  ) -> news_core::Result<Vec<news_core::NewsItem>> {
    let source_id = adapter.source_id().to_string();
    let _permit = self.semaphore.acquire().await.expect("semaphore not closed");
    let source_lock = self.lock_for(&source_id).await;
    let _guard = source_lock.lock().await;

    let deadline = Duration::from_secs(update_interval_secs.max(1) as u64).min(self.fetch_timeout_ceiling);
    let outcome = tokio::time::timeout(deadline, adapter.fetch(force)).await;

    let now = Utc::now().naive_utc();
    let mut statuses = self.statuses.lock().await;
    let status = statuses.entry(source_id.clone()).or_default();

    match outcome {
      Ok(Ok(items)) => {
        status.last_success = Some(now);
        status.last_error = None;
        status.consecutive_failures = 0;
        status.record_news_count(items.len());
        let next_interval =
          if self.adaptive { adaptive_interval(update_interval_secs, status) } else { update_interval_secs };
        status.next_due = Some(now + chrono::Duration::seconds(next_interval));
        Ok(items)
      }
      Ok(Err(e)) => {
        warn!(source_id, "fetch failed: {e}");
        status.last_error = Some(e.to_string());
        status.consecutive_failures += 1;
        let next_interval =
          if self.adaptive { adaptive_interval(update_interval_secs, status) } else { update_interval_secs };
        status.next_due = Some(now + chrono::Duration::seconds(next_interval));
        Err(e)
      }
      Err(_) => {
        warn!(source_id, "fetch timed out after {:?}", deadline);
        status.last_error = Some("timeout".to_string());
        status.consecutive_failures += 1;
        let next_interval =
          if self.adaptive { adaptive_interval(update_interval_secs, status) } else { update_interval_secs };
        status.next_due = Some(now + chrono::Duration::seconds(next_interval));
        Err(news_core::Error::Unexpected(format!("fetch timed out after {deadline:?}")))
      }
    }
  }

  pub async fn is_due(&self, source_id: &str) -> bool {
    let statuses = self.statuses.lock().await;
    match statuses.get(source_id).and_then(|s| s.next_due) {
      Some(next_due) => Utc::now().naive_utc() >= next_due,
      None => true,
    }
  }

  pub async fn status(&self, source_id: &str) -> Option<SourceStatus> {
    self.statuses.lock().await.get(source_id).cloned()
  }

  pub async fn all_statuses(&self) -> HashMap<String, SourceStatus> {
    self.statuses.lock().await.clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use news_core::{NewsItem, Result};

  struct StubAdapter {
    id: String,
    result: Mutex<Option<Result<Vec<NewsItem>>>>,
  }

  #[async_trait]
  impl SourceAdapter for StubAdapter {
    async fn fetch(&self, _force: bool) -> Result<Vec<NewsItem>> {
      self.result.lock().await.take().unwrap()
    }
    async fn clear_cache(&self) {}
    fn source_id(&self) -> &str {
      &self.id
    }
  }

  #[test]
  fn test_adaptive_interval_grows_with_failures() {
    let mut status = SourceStatus::default();
    status.consecutive_failures = 2;
    let interval = adaptive_interval(600, &status);
    assert!(interval > 600);
  }

  #[test]
  fn test_adaptive_interval_shrinks_with_activity() {
    let mut status = SourceStatus::default();
    status.recent_news_counts = vec![20, 20, 20];
    let interval = adaptive_interval(600, &status);
    assert!(interval < 600);
  }

  #[test]
  fn test_adaptive_interval_clamps_to_bounds() {
    let mut status = SourceStatus::default();
    status.consecutive_failures = 1000;
    assert_eq!(adaptive_interval(600, &status), MAX_INTERVAL_SECS);
  }

  #[tokio::test]
  async fn test_fetch_source_success_resets_failure_count() {
    let scheduler = Scheduler::new(4, true, Duration::from_secs(30));
    let adapter = StubAdapter { id: "bbc".to_string(), result: Mutex::new(Some(Ok(vec![]))) };
    let ok = scheduler.fetch_source(&adapter, false, 600).await;
    assert!(ok);
    let status = scheduler.status("bbc").await.unwrap();
    assert_eq!(status.consecutive_failures, 0);
    assert!(status.next_due.is_some());
  }

  #[tokio::test]
  async fn test_fetch_source_error_increments_failures() {
    let scheduler = Scheduler::new(4, true, Duration::from_secs(30));
    let adapter = StubAdapter {
      id: "bbc".to_string(),
      result: Mutex::new(Some(Err(news_core::Error::Unexpected("boom".to_string())))),
    };
    let ok = scheduler.fetch_source(&adapter, false, 600).await;
    assert!(!ok);
    let status = scheduler.status("bbc").await.unwrap();
    assert_eq!(status.consecutive_failures, 1);
  }

  #[tokio::test]
  async fn test_is_due_true_before_any_fetch() {
    let scheduler = Scheduler::new(4, true, Duration::from_secs(30));
    assert!(scheduler.is_due("never-fetched").await);
  }
}
