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

//! Title-fingerprint deduplication (§4.6), grounded on the original
//! `_generate_title_fingerprint`/`_is_duplicate` pair: strip punctuation,
//! lowercase, drop whitespace, then check-and-insert in one step. Applied
//! after the per-source cache store and before the Aggregator.

use news_core::NewsItem;
use std::collections::VecDeque;
use std::sync::Mutex;

const HIGH_WATER_MARK: usize = 10_000;
const TRIM_TO: usize = 5_000;

fn fingerprint(title: &str) -> String {
  title.chars().filter(|c| c.is_alphanumeric() || c.is_whitespace()).collect::<String>().to_lowercase().split_whitespace().collect()
}

struct State {
  seen: std::collections::HashSet<String>,
  order: VecDeque<String>,
}

pub struct Deduplicator {
  state: Mutex<State>,
}

impl Deduplicator {
  pub fn new() -> Self {
    Self { state: Mutex::new(State { seen: std::collections::HashSet::new(), order: VecDeque::new() }) }
  }

  /// Checks and inserts in one step; returns true if `item` is a duplicate
  /// of something already seen.
  pub fn is_duplicate(&self, item: &NewsItem) -> bool {
    let key = fingerprint(&item.title);
    let mut guard = self.state.lock().unwrap();

    if guard.seen.contains(&key) {
      return true;
    }

    guard.seen.insert(key.clone());
    guard.order.push_back(key);

    if guard.order.len() > HIGH_WATER_MARK {
      let drop_count = guard.order.len() - TRIM_TO;
      for _ in 0..drop_count {
        if let Some(oldest) = guard.order.pop_front() {
          guard.seen.remove(&oldest);
        }
      }
    }

    false
  }

  pub fn len(&self) -> usize {
    self.state.lock().unwrap().order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Default for Deduplicator {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(title: &str) -> NewsItem {
    NewsItem {
      id: "1".to_string(),
      source_id: "s".to_string(),
      source_name: "s".to_string(),
      title: title.to_string(),
      url: "http://x".to_string(),
      mobile_url: None,
      content: None,
      summary: None,
      image_url: None,
      published_at: None,
      extra: Default::default(),
    }
  }

  #[test]
  fn test_first_occurrence_is_not_a_duplicate() {
    let dedup = Deduplicator::new();
    assert!(!dedup.is_duplicate(&item("Breaking: markets rally")));
  }

  #[test]
  fn test_second_occurrence_is_a_duplicate() {
    let dedup = Deduplicator::new();
    dedup.is_duplicate(&item("Breaking: markets rally"));
    assert!(dedup.is_duplicate(&item("Breaking: markets rally")));
  }

  #[test]
  fn test_punctuation_and_case_insensitive() {
    let dedup = Deduplicator::new();
    dedup.is_duplicate(&item("Breaking: Markets Rally!"));
    assert!(dedup.is_duplicate(&item("breaking markets rally")));
  }

  #[test]
  fn test_trims_when_over_high_water_mark() {
    let dedup = Deduplicator::new();
    for i in 0..(HIGH_WATER_MARK + 1) {
      dedup.is_duplicate(&item(&format!("story {i}")));
    }
    assert_eq!(dedup.len(), TRIM_TO);
    // the earliest entries were evicted, so they're no longer flagged as duplicates
    assert!(!dedup.is_duplicate(&item("story 0")));
  }
}
