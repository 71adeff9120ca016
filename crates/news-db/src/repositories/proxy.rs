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

//! Concrete Diesel implementation of `news_client::ProxyRepository`. Lives
//! here (not in news-client) so the transport crate never depends on Diesel;
//! `news-engine` wires this in as an `Arc<dyn ProxyRepository>`.

use crate::connection::DatabaseContext;
use crate::error::DbError;
use crate::models::{proxy_status_to_db, ProxyConfigRow};
use crate::schema::proxy_configs;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use news_client::{ProxyRepository, ProxyStatus};
use news_core::Result;

pub struct DieselProxyRepository {
  ctx: DatabaseContext,
}

impl DieselProxyRepository {
  pub fn new(ctx: DatabaseContext) -> Self {
    Self { ctx }
  }
}

#[async_trait]
impl ProxyRepository for DieselProxyRepository {
  async fn list_all(&self) -> Result<Vec<news_client::ProxyConfig>> {
    let rows: Vec<ProxyConfigRow> = self
      .ctx
      .run(move |conn| proxy_configs::table.load::<ProxyConfigRow>(conn).map_err(DbError::from))
      .await?;
    rows.into_iter().map(ProxyConfigRow::into_proxy_config).collect()
  }

  async fn update_health(
    &self,
    id: i32,
    status: ProxyStatus,
    avg_response_time: Option<f64>,
    last_error: Option<String>,
  ) -> Result<()> {
    let now = Utc::now();
    let status_str = proxy_status_to_db(status);

    self
      .ctx
      .run(move |conn| {
        diesel::update(proxy_configs::table.find(id))
          .set((
            proxy_configs::status.eq(status_str),
            proxy_configs::avg_response_time.eq(avg_response_time),
            proxy_configs::last_error.eq(&last_error),
            proxy_configs::last_check_time.eq(Some(now)),
          ))
          .execute(conn)
          .map_err(DbError::from)
      })
      .await?;
    Ok(())
  }
}
