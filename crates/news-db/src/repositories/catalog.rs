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

//! The source catalog: the core writes only `last_updated`, `last_error`,
//! `news_count`, and `status` back to `sources` (§3.1); everything else is
//! seeded externally and just read.

use crate::connection::DatabaseContext;
use crate::error::DbError;
use crate::models::SourceRow;
use crate::schema::sources;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use news_core::{Result, Source};

#[async_trait]
pub trait SourceCatalogRepository: Send + Sync {
  async fn list_all(&self) -> Result<Vec<Source>>;
  async fn get(&self, source_id: &str) -> Result<Option<Source>>;
  async fn list_by_category(&self, category: &str) -> Result<Vec<Source>>;
  async fn list_by_country(&self, country: &str) -> Result<Vec<Source>>;
  async fn list_by_language(&self, language: &str) -> Result<Vec<Source>>;

  /// Record the outcome of a fetch: bumps `news_count`, sets `last_updated`,
  /// and clears or sets `last_error`/`status` depending on success.
  async fn record_fetch_outcome(
    &self,
    source_id: &str,
    items_fetched: usize,
    error: Option<&str>,
  ) -> Result<()>;
}

pub struct DieselSourceCatalogRepository {
  ctx: DatabaseContext,
}

impl DieselSourceCatalogRepository {
  pub fn new(ctx: DatabaseContext) -> Self {
    Self { ctx }
  }
}

#[async_trait]
impl SourceCatalogRepository for DieselSourceCatalogRepository {
  async fn list_all(&self) -> Result<Vec<Source>> {
    let rows: Vec<SourceRow> = self
      .ctx
      .run(move |conn| sources::table.load::<SourceRow>(conn).map_err(DbError::from))
      .await?;
    rows.into_iter().map(SourceRow::into_source).collect()
  }

  async fn get(&self, source_id: &str) -> Result<Option<Source>> {
    let id = source_id.to_string();
    let row: Option<SourceRow> = self
      .ctx
      .run(move |conn| {
        sources::table.find(id).first::<SourceRow>(conn).optional().map_err(DbError::from)
      })
      .await?;
    row.map(SourceRow::into_source).transpose()
  }

  async fn list_by_category(&self, category: &str) -> Result<Vec<Source>> {
    let category = category.to_string();
    let rows: Vec<SourceRow> = self
      .ctx
      .run(move |conn| {
        sources::table
          .filter(sources::category.eq(category))
          .load::<SourceRow>(conn)
          .map_err(DbError::from)
      })
      .await?;
    rows.into_iter().map(SourceRow::into_source).collect()
  }

  async fn list_by_country(&self, country: &str) -> Result<Vec<Source>> {
    let country = country.to_string();
    let rows: Vec<SourceRow> = self
      .ctx
      .run(move |conn| {
        sources::table
          .filter(sources::country.eq(country))
          .load::<SourceRow>(conn)
          .map_err(DbError::from)
      })
      .await?;
    rows.into_iter().map(SourceRow::into_source).collect()
  }

  async fn list_by_language(&self, language: &str) -> Result<Vec<Source>> {
    let language = language.to_string();
    let rows: Vec<SourceRow> = self
      .ctx
      .run(move |conn| {
        sources::table
          .filter(sources::language.eq(language))
          .load::<SourceRow>(conn)
          .map_err(DbError::from)
      })
      .await?;
    rows.into_iter().map(SourceRow::into_source).collect()
  }

  async fn record_fetch_outcome(
    &self,
    source_id: &str,
    items_fetched: usize,
    error: Option<&str>,
  ) -> Result<()> {
    let source_id = source_id.to_string();
    let now = Utc::now();
    let error = error.map(|e| e.to_string());
    let status = if error.is_some() { "ERROR" } else { "ACTIVE" };

    self
      .ctx
      .run(move |conn| {
        diesel::update(sources::table.find(source_id))
          .set((
            sources::last_updated.eq(Some(now)),
            sources::last_error.eq(&error),
            sources::status.eq(status),
            sources::news_count.eq(sources::news_count + items_fetched as i32),
          ))
          .execute(conn)
          .map_err(DbError::from)
      })
      .await?;
    Ok(())
  }
}
