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

//! A write-through stats accumulator wrapping each adapter fetch (§4.8).
//!
//! `wrap_fetch` takes an explicit [`ApiType`] argument and the fetch future
//! itself, rather than the original's method-swapping (replacing
//! `source.fetch` with a wrapped closure, then restoring it in `finally`) —
//! REDESIGN FLAGS §9 calls that pattern out explicitly. The accumulator never
//! drops stats on a flush failure; a failed flush just means they merge with
//! the next cycle's numbers.

use chrono::Utc;
use news_core::{NewsItem, Result};
use news_db::{StatsDelta, StatsRepository};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{error, warn};

/// Distinguishes scheduler-tick calls from caller-directed ones, per the
/// resolved §9 Open Question on `api_type` recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiType {
  Internal,
  External,
}

impl ApiType {
  fn as_str(self) -> &'static str {
    match self {
      ApiType::Internal => "internal",
      ApiType::External => "external",
    }
  }

  fn from_str(s: &str) -> Option<ApiType> {
    match s {
      "internal" => Some(ApiType::Internal),
      "external" => Some(ApiType::External),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Default)]
struct Accumulator {
  total_requests: i64,
  error_count: i64,
  news_count: i64,
  total_response_time_ms: f64,
  last_response_time_ms: f64,
  last_flush: Option<Instant>,
}

pub struct StatsCollector {
  repository: Option<Arc<dyn StatsRepository>>,
  accumulators: Mutex<HashMap<(String, &'static str), Accumulator>>,
  flush_interval: Duration,
  max_flush_retries: u32,
}

impl StatsCollector {
  pub fn new(repository: Option<Arc<dyn StatsRepository>>) -> Self {
    Self {
      repository,
      accumulators: Mutex::new(HashMap::new()),
      flush_interval: Duration::from_secs(3600),
      max_flush_retries: 3,
    }
  }

  pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
    self.flush_interval = flush_interval;
    self
  }

  /// Times `fetch`, records the outcome, and schedules a background flush
  /// when the accumulator is stale or the call errored.
  pub async fn wrap_fetch<F, Fut>(
    &self,
    source_id: &str,
    api_type: ApiType,
    fetch: F,
  ) -> Result<Vec<NewsItem>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<NewsItem>>>,
  {
    let start = Instant::now();
    let result = fetch().await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let news_count = result.as_ref().map(|items| items.len()).unwrap_or(0);
    let is_error = result.is_err();

    let should_flush = self.record(source_id, api_type, elapsed_ms, news_count, is_error);
    if should_flush {
      self.flush_one(source_id, api_type).await;
    }

    result
  }

  fn record(
    &self,
    source_id: &str,
    api_type: ApiType,
    elapsed_ms: f64,
    news_count: usize,
    is_error: bool,
  ) -> bool {
    let mut guard = self.accumulators.lock().unwrap();
    let entry = guard.entry((source_id.to_string(), api_type.as_str())).or_default();
    entry.total_requests += 1;
    if is_error {
      entry.error_count += 1;
    }
    entry.news_count += news_count as i64;
    entry.total_response_time_ms += elapsed_ms;
    entry.last_response_time_ms = elapsed_ms;

    let due = entry.last_flush.map(|t| t.elapsed() >= self.flush_interval).unwrap_or(true);
    due || is_error
  }

  async fn flush_one(&self, source_id: &str, api_type: ApiType) {
    let Some(repository) = &self.repository else { return };

    let delta = {
      let mut guard = self.accumulators.lock().unwrap();
      let key = (source_id.to_string(), api_type.as_str());
      let Some(entry) = guard.get_mut(&key) else { return };
      let delta = StatsDelta {
        source_id: source_id.to_string(),
        api_type: api_type.as_str().to_string(),
        success_rate: if entry.total_requests == 0 {
          1.0
        } else {
          1.0 - (entry.error_count as f64 / entry.total_requests as f64)
        },
        avg_response_time: if entry.total_requests == 0 {
          0.0
        } else {
          entry.total_response_time_ms / entry.total_requests as f64
        },
        last_response_time: entry.last_response_time_ms,
        total_requests: entry.total_requests,
        error_count: entry.error_count,
        news_count: entry.news_count,
      };
      delta
    };

    let mut attempt = 0;
    loop {
      attempt += 1;
      match repository.append(delta.clone()).await {
        Ok(()) => {
          let mut guard = self.accumulators.lock().unwrap();
          if let Some(entry) = guard.get_mut(&(source_id.to_string(), api_type.as_str())) {
            *entry = Accumulator { last_flush: Some(Instant::now()), ..Default::default() };
          }
          return;
        }
        Err(e) if attempt < self.max_flush_retries => {
          warn!(source_id, attempt, "stats flush failed, retrying: {e}");
          tokio::time::sleep(Duration::from_millis(200 * attempt as u64)).await;
        }
        Err(e) => {
          error!(source_id, "stats flush exhausted retries, stats remain accumulated: {e}");
          return;
        }
      }
    }
  }

  /// Flushes every accumulator regardless of staleness, for a caller-driven
  /// "stats flush" command rather than the time/error-triggered path in
  /// `wrap_fetch`.
  pub async fn flush_all(&self) {
    let keys: Vec<(String, &'static str)> = self.accumulators.lock().unwrap().keys().cloned().collect();
    for (source_id, api_type_str) in keys {
      if let Some(api_type) = ApiType::from_str(api_type_str) {
        self.flush_one(&source_id, api_type).await;
      }
    }
  }

  pub fn snapshot(&self, source_id: &str, api_type: ApiType) -> Option<(i64, i64, i64)> {
    let guard = self.accumulators.lock().unwrap();
    guard
      .get(&(source_id.to_string(), api_type.as_str()))
      .map(|e| (e.total_requests, e.error_count, e.news_count))
  }

  #[allow(dead_code)]
  fn flush_timestamp(&self) -> chrono::DateTime<chrono::Utc> {
    Utc::now()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use std::sync::atomic::{AtomicUsize, Ordering};

  struct FakeRepository {
    appended: Mutex<Vec<StatsDelta>>,
    fail_times: AtomicUsize,
  }

  #[async_trait]
  impl StatsRepository for FakeRepository {
    async fn append(&self, delta: StatsDelta) -> Result<()> {
      if self.fail_times.load(Ordering::SeqCst) > 0 {
        self.fail_times.fetch_sub(1, Ordering::SeqCst);
        return Err(news_core::Error::StatsFlush("simulated failure".to_string()));
      }
      self.appended.lock().unwrap().push(delta);
      Ok(())
    }
    async fn append_batch(&self, deltas: Vec<StatsDelta>) -> Result<()> {
      for d in deltas {
        self.append(d).await?;
      }
      Ok(())
    }
  }

  fn item() -> NewsItem {
    NewsItem {
      id: "1".to_string(),
      source_id: "s".to_string(),
      source_name: "s".to_string(),
      title: "t".to_string(),
      url: "http://x".to_string(),
      mobile_url: None,
      content: None,
      summary: None,
      image_url: None,
      published_at: None,
      extra: Default::default(),
    }
  }

  #[tokio::test]
  async fn test_successful_fetch_accumulates_and_flushes_on_error_only() {
    let repo = Arc::new(FakeRepository { appended: Mutex::new(Vec::new()), fail_times: AtomicUsize::new(0) });
    let collector = StatsCollector::new(Some(repo.clone()));
    collector
      .wrap_fetch("bbc", ApiType::Internal, || async { Ok(vec![item()]) })
      .await
      .unwrap();
    // not yet due for a time-based flush, and no error, so nothing appended yet
    assert!(repo.appended.lock().unwrap().is_empty());
    let snapshot = collector.snapshot("bbc", ApiType::Internal).unwrap();
    assert_eq!(snapshot, (1, 0, 1));
  }

  #[tokio::test]
  async fn test_error_triggers_immediate_flush() {
    let repo = Arc::new(FakeRepository { appended: Mutex::new(Vec::new()), fail_times: AtomicUsize::new(0) });
    let collector = StatsCollector::new(Some(repo.clone()));
    let result = collector
      .wrap_fetch("bbc", ApiType::Internal, || async { Err(news_core::Error::Unexpected("boom".to_string())) })
      .await;
    assert!(result.is_err());
    assert_eq!(repo.appended.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_flush_retries_then_succeeds() {
    let repo = Arc::new(FakeRepository { appended: Mutex::new(Vec::new()), fail_times: AtomicUsize::new(2) });
    let collector = StatsCollector::new(Some(repo.clone()));
    let _ = collector
      .wrap_fetch("bbc", ApiType::Internal, || async { Err(news_core::Error::Unexpected("boom".to_string())) })
      .await;
    assert_eq!(repo.appended.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_flush_exhaustion_keeps_stats_accumulated() {
    let repo = Arc::new(FakeRepository { appended: Mutex::new(Vec::new()), fail_times: AtomicUsize::new(10) });
    let collector = StatsCollector::new(Some(repo.clone()));
    let _ = collector
      .wrap_fetch("bbc", ApiType::Internal, || async { Err(news_core::Error::Unexpected("boom".to_string())) })
      .await;
    assert!(repo.appended.lock().unwrap().is_empty());
    let snapshot = collector.snapshot("bbc", ApiType::Internal).unwrap();
    assert_eq!(snapshot.0, 1);
  }
}
