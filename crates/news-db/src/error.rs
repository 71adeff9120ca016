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

//! Raw database errors, converted into `news_core::Error` at the repository
//! trait boundary so callers outside this crate never see Diesel types.

use news_core::Error as CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
  #[error("connection pool error: {0}")]
  Pool(String),

  #[error("query error: {0}")]
  Query(String),

  #[error("record not found: {0}")]
  NotFound(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("task join error: {0}")]
  Join(String),
}

impl From<diesel::result::Error> for DbError {
  fn from(err: diesel::result::Error) -> Self {
    match err {
      diesel::result::Error::NotFound => DbError::NotFound("no matching row".to_string()),
      other => DbError::Query(other.to_string()),
    }
  }
}

impl From<diesel::r2d2::PoolError> for DbError {
  fn from(err: diesel::r2d2::PoolError) -> Self {
    DbError::Pool(err.to_string())
  }
}

/// Bridges into the crate-wide error so repository traits can return
/// `news_core::Result` directly (§7: "component-specific error enums convert
/// into this one at the boundaries").
impl From<DbError> for CoreError {
  fn from(err: DbError) -> Self {
    match err {
      DbError::NotFound(msg) => CoreError::NoSuchSource(msg),
      DbError::Pool(_) => CoreError::CatalogUnavailable,
      other => CoreError::Unexpected(other.to_string()),
    }
  }
}

pub type DbResult<T> = std::result::Result<T, DbError>;
