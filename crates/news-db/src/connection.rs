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

//! Connection pooling. Fails fast: `DatabaseContext::new` tests the
//! connection before handing control to r2d2, so a down database surfaces as
//! an immediate startup error rather than an endlessly retrying pool.

use crate::error::{DbError, DbResult};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use std::sync::Arc;
use std::time::Duration;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<PgConnection>>;

const MAX_POOL_SIZE: u32 = 20;
const MIN_POOL_IDLE: u32 = 2;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct DatabaseContext {
  pool: Arc<DbPool>,
}

impl DatabaseContext {
  pub fn new(database_url: &str) -> DbResult<Self> {
    Self::with_pool_config(database_url, MAX_POOL_SIZE, MIN_POOL_IDLE)
  }

  pub fn with_pool_config(database_url: &str, max_size: u32, min_idle: u32) -> DbResult<Self> {
    Self::with_pool_config_and_timeout(database_url, max_size, min_idle, CONNECTION_TIMEOUT_SECS)
  }

  pub fn with_pool_config_and_timeout(
    database_url: &str,
    max_size: u32,
    min_idle: u32,
    timeout_secs: u64,
  ) -> DbResult<Self> {
    PgConnection::establish(database_url)
      .map_err(|e| DbError::Pool(format!("failed to connect: {e}")))?;

    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
      .max_size(max_size)
      .min_idle(Some(min_idle))
      .connection_timeout(Duration::from_secs(timeout_secs))
      .build(manager)
      .map_err(DbError::from)?;

    Ok(Self { pool: Arc::new(pool) })
  }

  pub fn get_connection(&self) -> DbResult<DbConn> {
    self.pool.get().map_err(DbError::from)
  }

  pub fn pool(&self) -> &DbPool {
    &self.pool
  }

  /// Run a blocking Diesel closure on the blocking thread pool, bridging
  /// sync Diesel into the async repository methods that call it.
  pub async fn run<F, R>(&self, f: F) -> DbResult<R>
  where
    F: FnOnce(&mut DbConn) -> DbResult<R> + Send + 'static,
    R: Send + 'static,
  {
    let pool = Arc::clone(&self.pool);
    tokio::task::spawn_blocking(move || {
      let mut conn = pool.get().map_err(DbError::from)?;
      f(&mut conn)
    })
    .await
    .map_err(|e| DbError::Join(e.to_string()))?
  }
}
