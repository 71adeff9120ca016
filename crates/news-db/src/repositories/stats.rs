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

//! Appends per-(source, api_type) stat rows (§3.1: the core only ever
//! appends to `source_stats`, never updates in place — the accumulation
//! happens in `StatsCollector` and is flushed as a single row per interval).

use crate::connection::DatabaseContext;
use crate::error::DbError;
use crate::models::NewSourceStatRow;
use crate::schema::source_stats;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use news_core::Result;

#[derive(Debug, Clone)]
pub struct StatsDelta {
  pub source_id: String,
  pub api_type: String,
  pub success_rate: f64,
  pub avg_response_time: f64,
  pub last_response_time: f64,
  pub total_requests: i64,
  pub error_count: i64,
  pub news_count: i64,
}

#[async_trait]
pub trait StatsRepository: Send + Sync {
  async fn append(&self, delta: StatsDelta) -> Result<()>;
  async fn append_batch(&self, deltas: Vec<StatsDelta>) -> Result<()>;
}

pub struct DieselStatsRepository {
  ctx: DatabaseContext,
}

impl DieselStatsRepository {
  pub fn new(ctx: DatabaseContext) -> Self {
    Self { ctx }
  }
}

#[async_trait]
impl StatsRepository for DieselStatsRepository {
  async fn append(&self, delta: StatsDelta) -> Result<()> {
    self.append_batch(vec![delta]).await
  }

  async fn append_batch(&self, deltas: Vec<StatsDelta>) -> Result<()> {
    if deltas.is_empty() {
      return Ok(());
    }
    let now = Utc::now();
    let rows: Vec<NewSourceStatRow> = deltas
      .into_iter()
      .map(|d| NewSourceStatRow {
        source_id: d.source_id,
        api_type: d.api_type,
        success_rate: d.success_rate,
        avg_response_time: d.avg_response_time,
        last_response_time: d.last_response_time,
        total_requests: d.total_requests,
        error_count: d.error_count,
        news_count: d.news_count,
        created_at: now,
      })
      .collect();

    self
      .ctx
      .run(move |conn| {
        diesel::insert_into(source_stats::table).values(&rows).execute(conn).map_err(DbError::from)
      })
      .await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_stats_delta_construction() {
    let delta = StatsDelta {
      source_id: "bbc".to_string(),
      api_type: "internal".to_string(),
      success_rate: 1.0,
      avg_response_time: 120.0,
      last_response_time: 100.0,
      total_requests: 5,
      error_count: 0,
      news_count: 12,
    };
    assert_eq!(delta.source_id, "bbc");
    assert_eq!(delta.api_type, "internal");
  }
}
