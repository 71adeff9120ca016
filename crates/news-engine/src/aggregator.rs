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

//! Topic clustering (§4.7), grounded on the original `NewsCluster`/
//! `NewsAggregator`: TF-IDF cosine similarity over title+summary decides
//! cluster membership, with a longest-common-subsequence ratio as a fallback
//! for degenerate (empty-after-stopwords) input. Tokenization is
//! whitespace/CJK-aware: whitespace-delimited runs are tokens, and any run
//! of CJK codepoints is additionally split into individual-character tokens,
//! since CJK text carries no whitespace between words.

use chrono::{NaiveDateTime, Utc};
use news_core::NewsItem;
use std::collections::HashMap;
use std::sync::Mutex;

const SIMILARITY_THRESHOLD: f64 = 0.6;
const MAX_CLUSTERS: usize = 100;

const STOPWORDS: &[&str] = &["the", "a", "an", "of", "and", "的", "了", "和", "是", "在", "有", "为", "与", "等", "这", "那", "也", "中", "上", "下"];

fn is_cjk(c: char) -> bool {
  matches!(c as u32,
    0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0x3040..=0x30FF | 0xAC00..=0xD7A3)
}

fn tokenize(text: &str) -> Vec<String> {
  let mut tokens = Vec::new();
  for word in text.split_whitespace() {
    let mut buf = String::new();
    for c in word.chars() {
      if is_cjk(c) {
        if !buf.is_empty() {
          tokens.push(std::mem::take(&mut buf));
        }
        tokens.push(c.to_string());
      } else {
        buf.push(c);
      }
    }
    if !buf.is_empty() {
      tokens.push(buf);
    }
  }
  tokens
    .into_iter()
    .map(|t| t.to_lowercase())
    .filter(|t| !t.is_empty() && !STOPWORDS.contains(&t.as_str()))
    .collect()
}

fn term_frequencies(tokens: &[String]) -> HashMap<String, f64> {
  let mut counts: HashMap<String, f64> = HashMap::new();
  for token in tokens {
    *counts.entry(token.clone()).or_insert(0.0) += 1.0;
  }
  let total = tokens.len().max(1) as f64;
  for value in counts.values_mut() {
    *value /= total;
  }
  counts
}

fn cosine_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
  let dot: f64 = a.iter().map(|(term, weight)| weight * b.get(term).copied().unwrap_or(0.0)).sum();
  let norm_a = a.values().map(|v| v * v).sum::<f64>().sqrt();
  let norm_b = b.values().map(|v| v * v).sum::<f64>().sqrt();
  if norm_a == 0.0 || norm_b == 0.0 {
    0.0
  } else {
    dot / (norm_a * norm_b)
  }
}

/// Ratio-of-longest-common-subsequence over titles, used when TF-IDF
/// degenerates to an empty vector (every token stripped as a stopword).
fn lcs_ratio(a: &str, b: &str) -> f64 {
  let a: Vec<char> = a.chars().collect();
  let b: Vec<char> = b.chars().collect();
  if a.is_empty() || b.is_empty() {
    return 0.0;
  }
  let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
  for i in 1..=a.len() {
    for j in 1..=b.len() {
      dp[i][j] = if a[i - 1] == b[j - 1] { dp[i - 1][j - 1] + 1 } else { dp[i - 1][j].max(dp[i][j - 1]) };
    }
  }
  let lcs = dp[a.len()][b.len()] as f64;
  (2.0 * lcs) / (a.len() + b.len()) as f64
}

fn doc_text(item: &NewsItem) -> String {
  format!("{} {}", item.title, item.summary.as_deref().unwrap_or(""))
}

pub struct Cluster {
  pub main: NewsItem,
  pub related: Vec<NewsItem>,
  pub sources: std::collections::HashSet<String>,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
  main_tf: HashMap<String, f64>,
}

impl Cluster {
  fn new(main: NewsItem, now: NaiveDateTime) -> Self {
    let mut sources = std::collections::HashSet::new();
    sources.insert(main.source_id.clone());
    let main_tf = term_frequencies(&tokenize(&doc_text(&main)));
    Self { main, related: Vec::new(), sources, created_at: now, updated_at: now, main_tf }
  }

  fn add(&mut self, item: NewsItem, now: NaiveDateTime) {
    self.sources.insert(item.source_id.clone());
    self.related.push(item);
    self.updated_at = now;
  }

  pub fn score(&self, now: NaiveDateTime) -> f64 {
    let base = (self.related.len() + self.sources.len()) as f64;
    let time_decay = match self.main.published_at {
      Some(published_at) => {
        let hours = (now - published_at).num_seconds() as f64 / 3600.0;
        if hours <= 24.0 {
          2.0 - (hours / 24.0)
        } else {
          1.0
        }
      }
      None => 1.0,
    };
    let top_bonus = if is_top(&self.main) { 1.5 } else { 1.0 };
    base * time_decay * top_bonus
  }

  pub fn category(&self) -> Option<&str> {
    self.main.extra.get("category").and_then(|v| v.as_str())
  }
}

fn is_top(item: &NewsItem) -> bool {
  item.extra.get("is_top").and_then(|v| v.as_bool()).unwrap_or(false)
}

pub struct Aggregator {
  clusters: Mutex<Vec<Cluster>>,
}

impl Aggregator {
  pub fn new() -> Self {
    Self { clusters: Mutex::new(Vec::new()) }
  }

  /// Finds the best-matching cluster by TF-IDF cosine similarity (falling
  /// back to LCS ratio on a degenerate empty token vector) and attaches the
  /// item if similarity clears the threshold; otherwise starts a new cluster.
  /// Evicts the lowest-scoring cluster if the cap is exceeded.
  pub fn add_item(&self, item: NewsItem) {
    let now = Utc::now().naive_utc();
    let tokens = tokenize(&doc_text(&item));
    let tf = term_frequencies(&tokens);

    let mut guard = self.clusters.lock().unwrap();
    let mut best: Option<(usize, f64)> = None;
    for (i, cluster) in guard.iter().enumerate() {
      let similarity = if tf.is_empty() || cluster.main_tf.is_empty() {
        lcs_ratio(&item.title, &cluster.main.title)
      } else {
        cosine_similarity(&tf, &cluster.main_tf)
      };
      if best.map(|(_, s)| similarity > s).unwrap_or(true) {
        best = Some((i, similarity));
      }
    }

    match best {
      Some((i, similarity)) if similarity >= SIMILARITY_THRESHOLD => {
        guard[i].add(item, now);
      }
      _ => {
        guard.push(Cluster::new(item, now));
      }
    }

    if guard.len() > MAX_CLUSTERS {
      guard.sort_by(|a, b| b.score(now).partial_cmp(&a.score(now)).unwrap());
      guard.truncate(MAX_CLUSTERS);
    }
  }

  pub fn add_batch(&self, items: Vec<NewsItem>) {
    for item in items {
      self.add_item(item);
    }
  }

  pub fn hot(&self, limit: usize) -> Vec<ClusterView> {
    let now = Utc::now().naive_utc();
    let guard = self.clusters.lock().unwrap();
    let mut views: Vec<ClusterView> = guard.iter().map(|c| ClusterView::from_cluster(c, now)).collect();
    views.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    views.truncate(limit);
    views
  }

  pub fn by_category(&self, category: &str, limit: usize) -> Vec<ClusterView> {
    let now = Utc::now().naive_utc();
    let guard = self.clusters.lock().unwrap();
    let mut views: Vec<ClusterView> = guard
      .iter()
      .filter(|c| c.category() == Some(category))
      .map(|c| ClusterView::from_cluster(c, now))
      .collect();
    views.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    views.truncate(limit);
    views
  }

  pub fn search(&self, query: &str, max_results: usize) -> Vec<NewsItem> {
    let needle = query.to_lowercase();
    let guard = self.clusters.lock().unwrap();
    let mut results = Vec::new();
    for cluster in guard.iter() {
      for candidate in std::iter::once(&cluster.main).chain(cluster.related.iter()) {
        if matches_query(candidate, &needle) {
          results.push(candidate.clone());
          if results.len() >= max_results {
            return results;
          }
        }
      }
    }
    results
  }

  pub fn len(&self) -> usize {
    self.clusters.lock().unwrap().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Default for Aggregator {
  fn default() -> Self {
    Self::new()
  }
}

fn matches_query(item: &NewsItem, needle: &str) -> bool {
  item.title.to_lowercase().contains(needle)
    || item.summary.as_deref().unwrap_or_default().to_lowercase().contains(needle)
    || item.content.as_deref().unwrap_or_default().to_lowercase().contains(needle)
}

#[derive(Debug, Clone)]
pub struct ClusterView {
  pub main: NewsItem,
  pub related_count: usize,
  pub sources_count: usize,
  pub score: f64,
}

impl ClusterView {
  fn from_cluster(cluster: &Cluster, now: NaiveDateTime) -> Self {
    Self {
      main: cluster.main.clone(),
      related_count: cluster.related.len(),
      sources_count: cluster.sources.len(),
      score: cluster.score(now),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(source_id: &str, title: &str, summary: &str) -> NewsItem {
    NewsItem {
      id: format!("{source_id}-{title}"),
      source_id: source_id.to_string(),
      source_name: source_id.to_string(),
      title: title.to_string(),
      url: format!("http://x/{title}"),
      mobile_url: None,
      content: None,
      summary: Some(summary.to_string()),
      image_url: None,
      published_at: Some(Utc::now().naive_utc()),
      extra: Default::default(),
    }
  }

  #[test]
  fn test_tokenize_splits_cjk_into_characters() {
    let tokens = tokenize("股市 大涨 today");
    assert_eq!(tokens, vec!["股", "市", "大", "涨", "today"]);
  }

  #[test]
  fn test_similar_items_join_one_cluster() {
    let aggregator = Aggregator::new();
    aggregator.add_item(item("a", "Markets rally on rate cut hopes", "stocks surge broadly"));
    aggregator.add_item(item("b", "Markets rally on rate cut hopes today", "stocks surge broadly today"));
    assert_eq!(aggregator.len(), 1);
  }

  #[test]
  fn test_dissimilar_items_form_separate_clusters() {
    let aggregator = Aggregator::new();
    aggregator.add_item(item("a", "Markets rally on rate cuts", "stocks surge"));
    aggregator.add_item(item("b", "Local team wins championship game", "sports recap"));
    assert_eq!(aggregator.len(), 2);
  }

  #[test]
  fn test_hot_sorts_by_score_descending() {
    let aggregator = Aggregator::new();
    aggregator.add_item(item("a", "Story one", "summary one"));
    aggregator.add_item(item("b", "Story one", "summary one"));
    aggregator.add_item(item("c", "Completely different story", "other summary"));
    let hot = aggregator.hot(10);
    assert!(hot[0].score >= hot[1].score);
  }

  #[test]
  fn test_search_matches_title_case_insensitively() {
    let aggregator = Aggregator::new();
    aggregator.add_item(item("a", "Big Earnings Beat", "quarterly numbers"));
    let results = aggregator.search("earnings", 10);
    assert_eq!(results.len(), 1);
  }

  #[test]
  fn test_by_category_filters_on_extra_field() {
    let aggregator = Aggregator::new();
    let mut tech_item = item("a", "New chip announced", "silicon details");
    tech_item.extra.insert("category".to_string(), serde_json::json!("tech"));
    aggregator.add_item(tech_item);
    aggregator.add_item(item("b", "Unrelated sports news", "game recap"));
    assert_eq!(aggregator.by_category("tech", 10).len(), 1);
  }

  #[test]
  fn test_lcs_ratio_identical_strings_is_one() {
    assert_eq!(lcs_ratio("hello", "hello"), 1.0);
  }

  #[test]
  fn test_cosine_similarity_empty_vectors_is_zero() {
    let a = HashMap::new();
    let b = HashMap::new();
    assert_eq!(cosine_similarity(&a, &b), 0.0);
  }
}
