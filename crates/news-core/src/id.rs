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

//! Deterministic item id generation.
//!
//! Every adapter family needs the same guarantee (invariant 2 in the testable
//! properties): calling `fetch(force=true)` twice without source-side changes
//! must produce the same ids. We hash over the clearest natural key available
//! and fall back progressively, never over raw random state.

use sha1::{Digest, Sha1};

fn hash_hex(parts: &[&str]) -> String {
  let mut hasher = Sha1::new();
  for (i, part) in parts.iter().enumerate() {
    if i > 0 {
      hasher.update(b"|");
    }
    hasher.update(part.as_bytes());
  }
  format!("{:x}", hasher.finalize())
}

/// Id derived from an explicit natural key the adapter already knows (an API's
/// own item id, or a feed entry's guid).
pub fn from_natural_key(source_id: &str, natural_key: &str) -> String {
  hash_hex(&[source_id, natural_key])
}

/// Id derived from a URL, used when no natural key field is configured.
pub fn from_url(source_id: &str, url: &str) -> String {
  hash_hex(&[source_id, "url", url])
}

/// Id derived from the canonicalized item JSON, the last resort when neither
/// a natural key nor a URL is available.
pub fn from_canonical_json(source_id: &str, canonical_json: &str) -> String {
  hash_hex(&[source_id, "json", canonical_json])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_natural_key_is_deterministic() {
    let a = from_natural_key("bbc", "story-123");
    let b = from_natural_key("bbc", "story-123");
    assert_eq!(a, b);
  }

  #[test]
  fn test_from_natural_key_differs_per_source() {
    let a = from_natural_key("bbc", "story-123");
    let b = from_natural_key("cnn", "story-123");
    assert_ne!(a, b);
  }

  #[test]
  fn test_from_url_differs_from_natural_key() {
    let a = from_natural_key("bbc", "http://x/a");
    let b = from_url("bbc", "http://x/a");
    assert_ne!(a, b);
  }

  #[test]
  fn test_from_canonical_json_is_deterministic() {
    let a = from_canonical_json("bbc", r#"{"title":"T"}"#);
    let b = from_canonical_json("bbc", r#"{"title":"T"}"#);
    assert_eq!(a, b);
  }
}
