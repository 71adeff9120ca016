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

//! Transport-level errors. The runtime never swallows errors (§4.3); it
//! classifies them and hands them back to the caller, which is the adapter
//! layer that knows the `source_id` needed to build a `news_core::FetchError`.

use news_core::{FetchError, FetchErrorKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
  #[error("connection error: {0}")]
  Connection(String),
  #[error("timeout after {0:?}")]
  Timeout(std::time::Duration),
  #[error("http status {0}")]
  HttpStatus(u16),
  #[error("decode error: {0}")]
  Decode(String),
  #[error("no healthy proxy in group: {0}")]
  ProxyExhausted(String),
}

impl TransportError {
  /// Whether this error class is retryable (§4.3: 429/5xx and connect/read errors).
  pub fn is_retryable(&self) -> bool {
    match self {
      TransportError::Connection(_) | TransportError::Timeout(_) => true,
      TransportError::HttpStatus(code) => *code == 429 || (500..600).contains(code),
      TransportError::Decode(_) | TransportError::ProxyExhausted(_) => false,
    }
  }

  /// Promote to the adapter-facing `FetchError`, once the caller knows which
  /// source this failure belongs to.
  pub fn into_fetch_error(self, source_id: impl Into<String>) -> FetchError {
    let source_id = source_id.into();
    match self {
      TransportError::Connection(cause) => {
        FetchError::new(FetchErrorKind::Connection, source_id, cause)
      }
      TransportError::Timeout(d) => {
        FetchError::new(FetchErrorKind::Timeout, source_id, format!("timed out after {d:?}"))
      }
      TransportError::HttpStatus(code) => {
        FetchError::new(FetchErrorKind::HttpStatus(code), source_id, format!("http {code}"))
      }
      TransportError::Decode(cause) => FetchError::new(FetchErrorKind::Decode, source_id, cause),
      TransportError::ProxyExhausted(cause) => {
        FetchError::new(FetchErrorKind::Connection, source_id, format!("proxy exhausted: {cause}"))
      }
    }
  }
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_is_retryable() {
    assert!(TransportError::HttpStatus(503).is_retryable());
    assert!(TransportError::HttpStatus(429).is_retryable());
    assert!(!TransportError::HttpStatus(404).is_retryable());
    assert!(TransportError::Connection("refused".to_string()).is_retryable());
    assert!(!TransportError::Decode("bad utf8".to_string()).is_retryable());
  }

  #[test]
  fn test_into_fetch_error_preserves_source_id() {
    let err = TransportError::HttpStatus(503).into_fetch_error("bbc");
    assert_eq!(err.source_id, "bbc");
    assert_eq!(err.kind, FetchErrorKind::HttpStatus(503));
  }
}
