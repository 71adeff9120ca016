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

//! The remote tier backing `news_core::CacheRepository`, against a
//! `cache_entries` table shaped like the teacher's `api_response_cache`:
//! raw `sql_query` plus `QueryableByName` projections rather than a
//! `diesel::table!` macro, since this table holds opaque cache blobs rather
//! than a modeled entity (mirrors `CacheRepositoryImpl` in the teacher).

use crate::connection::DatabaseContext;
use crate::error::DbError;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Jsonb, Text, Timestamptz};
use news_core::{CacheRepository, Result};

pub struct DieselCacheRepository {
  ctx: DatabaseContext,
}

impl DieselCacheRepository {
  pub fn new(ctx: DatabaseContext) -> Self {
    Self { ctx }
  }
}

#[derive(QueryableByName)]
struct CacheValueRow {
  #[diesel(sql_type = Jsonb)]
  value: serde_json::Value,
}

#[derive(QueryableByName)]
struct TtlRow {
  #[diesel(sql_type = BigInt)]
  seconds_remaining: i64,
}

#[async_trait]
impl CacheRepository for DieselCacheRepository {
  async fn get_json(&self, key: &str) -> Result<Option<serde_json::Value>> {
    let key = key.to_string();
    let row: Option<CacheValueRow> = self
      .ctx
      .run(move |conn| {
        diesel::sql_query(
          "SELECT value FROM cache_entries WHERE key = $1 AND expires_at > NOW()",
        )
        .bind::<Text, _>(&key)
        .get_result(conn)
        .optional()
        .map_err(DbError::from)
      })
      .await?;
    Ok(row.map(|r| r.value))
  }

  async fn set_json(&self, key: &str, value: serde_json::Value, ttl_seconds: i64) -> Result<()> {
    let key = key.to_string();
    let expires_at = Utc::now() + chrono::Duration::seconds(ttl_seconds.max(0));

    self
      .ctx
      .run(move |conn| {
        diesel::sql_query(
          "INSERT INTO cache_entries (key, value, expires_at, stored_at)
           VALUES ($1, $2, $3, NOW())
           ON CONFLICT (key) DO UPDATE SET
             value = EXCLUDED.value,
             expires_at = EXCLUDED.expires_at,
             stored_at = NOW()",
        )
        .bind::<Text, _>(&key)
        .bind::<Jsonb, _>(&value)
        .bind::<Timestamptz, _>(expires_at)
        .execute(conn)
        .map_err(DbError::from)
      })
      .await?;
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<bool> {
    let key = key.to_string();
    let deleted = self
      .ctx
      .run(move |conn| {
        diesel::sql_query("DELETE FROM cache_entries WHERE key = $1")
          .bind::<Text, _>(&key)
          .execute(conn)
          .map_err(DbError::from)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn exists(&self, key: &str) -> Result<bool> {
    Ok(self.get_json(&key.to_string()).await?.is_some())
  }

  async fn ttl(&self, key: &str) -> Result<i64> {
    let key = key.to_string();
    let row: Option<TtlRow> = self
      .ctx
      .run(move |conn| {
        diesel::sql_query(
          "SELECT GREATEST(0, EXTRACT(EPOCH FROM (expires_at - NOW()))::BIGINT) AS seconds_remaining
           FROM cache_entries WHERE key = $1 AND expires_at > NOW()",
        )
        .bind::<Text, _>(&key)
        .get_result(conn)
        .optional()
        .map_err(DbError::from)
      })
      .await?;
    Ok(row.map(|r| r.seconds_remaining).unwrap_or(-1))
  }

  async fn cleanup_expired(&self) -> Result<usize> {
    let deleted = self
      .ctx
      .run(move |conn| {
        diesel::sql_query("DELETE FROM cache_entries WHERE expires_at <= NOW()")
          .execute(conn)
          .map_err(DbError::from)
      })
      .await?;
    Ok(deleted)
  }

  async fn clear_matching(&self, pattern: &str) -> Result<usize> {
    // Translate the glob pattern (`*`/`?`) into a SQL LIKE pattern and push
    // the scan down to the database rather than pulling every key back.
    let like_pattern = pattern.replace('%', "\\%").replace('_', "\\_").replace('*', "%").replace('?', "_");
    let deleted = self
      .ctx
      .run(move |conn| {
        diesel::sql_query("DELETE FROM cache_entries WHERE key LIKE $1 ESCAPE '\\'")
          .bind::<Text, _>(&like_pattern)
          .execute(conn)
          .map_err(DbError::from)
      })
      .await?;
    Ok(deleted)
  }
}

#[cfg(test)]
mod tests {
  // Exercised against a live database in the integration suite.
}
