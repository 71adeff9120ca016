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

use thiserror::Error;

/// The four classes of failure the Fetch Runtime can report (§4.3/§7).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchErrorKind {
  #[error("connection error")]
  Connection,
  #[error("timeout")]
  Timeout,
  #[error("http status {0}")]
  HttpStatus(u16),
  #[error("decode error")]
  Decode,
}

/// The error an adapter raises when retries, backups, and fallback APIs are
/// all exhausted (§4.2). Never fabricates items; the scheduler decides how
/// to surface it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("fetch failed for source {source_id}: {kind} ({cause})")]
pub struct FetchError {
  pub kind: FetchErrorKind,
  pub source_id: String,
  pub cause: String,
}

impl FetchError {
  pub fn new(kind: FetchErrorKind, source_id: impl Into<String>, cause: impl Into<String>) -> Self {
    Self { kind, source_id: source_id.into(), cause: cause.into() }
  }
}

/// Error kinds shared across the engine. Component-specific error enums
/// (`AdapterError`, `EngineError`, `RepositoryError`) convert into this one
/// at the boundaries named in the error handling design.
#[derive(Error, Debug)]
pub enum Error {
  #[error("environment variable error: {0}")]
  EnvVar(#[from] std::env::VarError),

  #[error("configuration error: {0}")]
  Config(String),

  #[error("serialization error")]
  Serde(#[from] serde_json::Error),

  #[error("date parsing error")]
  ParseDate(#[from] chrono::ParseError),

  #[error("missing required field: {0}")]
  MissingField(String),

  #[error("catalog store is unavailable")]
  CatalogUnavailable,

  #[error("no such source: {0}")]
  NoSuchSource(String),

  #[error("no adapter registered for source: {0}")]
  NoSuchAdapter(String),

  #[error("fetch error: {0}")]
  Fetch(#[from] FetchError),

  #[error("parse error for source {source_id}: {message}")]
  Parse { source_id: String, message: String },

  #[error("cache tier unavailable")]
  CacheUnavailable,

  #[error("stats flush failed: {0}")]
  StatsFlush(String),

  #[error("no healthy proxy in group: {0}")]
  ProxyExhausted(String),

  #[error("unexpected error: {0}")]
  Unexpected(String),
}

impl Error {
  /// Map to the `(status, error_code)` pair an HTTP layer would return,
  /// per the propagation policy in §7.
  pub fn http_status(&self) -> (u16, &'static str) {
    match self {
      Error::NoSuchSource(_) => (404, "no_such_source"),
      Error::Fetch(_) => (502, "fetch_error"),
      Error::CatalogUnavailable => (503, "catalog_unavailable"),
      _ => (500, "internal_error"),
    }
  }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_display_config() {
    let err = Error::Config("invalid timeout".to_string());
    assert_eq!(err.to_string(), "configuration error: invalid timeout");
  }

  #[test]
  fn test_error_display_no_such_source() {
    let err = Error::NoSuchSource("bbc".to_string());
    assert_eq!(err.to_string(), "no such source: bbc");
  }

  #[test]
  fn test_error_display_no_such_adapter() {
    let err = Error::NoSuchAdapter("weird_site".to_string());
    assert_eq!(err.to_string(), "no adapter registered for source: weird_site");
  }

  #[test]
  fn test_error_from_serde_json() {
    let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
    let err: Error = json_err.into();
    assert!(matches!(err, Error::Serde(_)));
  }

  #[test]
  fn test_error_from_env_var() {
    let env_err = std::env::VarError::NotPresent;
    let err: Error = env_err.into();
    assert!(matches!(err, Error::EnvVar(_)));
  }

  #[test]
  fn test_fetch_error_display() {
    let err = FetchError::new(FetchErrorKind::HttpStatus(503), "bbc", "service unavailable");
    assert_eq!(err.to_string(), "fetch failed for source bbc: http status 503 (service unavailable)");
  }

  #[test]
  fn test_http_status_mapping() {
    assert_eq!(Error::NoSuchSource("x".to_string()).http_status(), (404, "no_such_source"));
    assert_eq!(Error::CatalogUnavailable.http_status(), (503, "catalog_unavailable"));
    assert_eq!(
      Error::Fetch(FetchError::new(FetchErrorKind::Timeout, "x", "timed out")).http_status(),
      (502, "fetch_error")
    );
    assert_eq!(Error::Unexpected("x".to_string()).http_status(), (500, "internal_error"));
  }
}
