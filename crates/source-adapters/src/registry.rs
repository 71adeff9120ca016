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

//! Builds a `SourceAdapter` from a `Source` row's `type` and its
//! `config_json` blob (§4.1). Dispatch is by `SourceType`, a static match
//! rather than runtime reflection, per REDESIGN FLAGS §9.

use crate::config::{HtmlAdapterConfig, JsonApiAdapterConfig, RssAdapterConfig};
use crate::families::html::HtmlAdapter;
use crate::families::json_api::JsonApiAdapter;
use crate::families::rss::RssAdapter;
use crate::adapter::SourceAdapter;
use news_client::FetchRuntime;
use news_core::{Source, SourceType};
use std::sync::Arc;

/// Construct the adapter for `source`, using `source.config_json` (if
/// present) to build the family-specific config; sources without a usable
/// config, or with a `Browser` type built without the `browser` feature, are
/// skipped (not errored) per the Registry's `load_catalog` contract.
pub fn build_adapter(source: &Source, runtime: Arc<FetchRuntime>) -> Option<Box<dyn SourceAdapter>> {
  let config_json = source.config.clone();
  let cache_ttl_seconds = i64::from(source.cache_ttl_seconds);

  match source.source_type {
    SourceType::Html => {
      let config: HtmlAdapterConfig = serde_json::from_value(config_json).ok()?;
      Some(Box::new(HtmlAdapter::new(
        source.source_id.clone(),
        source.name.clone(),
        config,
        runtime,
        cache_ttl_seconds,
      )))
    }
    SourceType::Api => {
      let config: JsonApiAdapterConfig = serde_json::from_value(config_json).ok()?;
      Some(Box::new(JsonApiAdapter::new(
        source.source_id.clone(),
        source.name.clone(),
        config,
        runtime,
        cache_ttl_seconds,
      )))
    }
    SourceType::Rss => {
      let config: RssAdapterConfig = serde_json::from_value(config_json).ok()?;
      Some(Box::new(RssAdapter::new(
        source.source_id.clone(),
        source.name.clone(),
        config,
        runtime,
        cache_ttl_seconds,
      )))
    }
    SourceType::Browser => build_browser_adapter(source, runtime),
    SourceType::Mixed => None,
  }
}

#[cfg(feature = "browser")]
fn build_browser_adapter(source: &Source, _runtime: Arc<FetchRuntime>) -> Option<Box<dyn SourceAdapter>> {
  use crate::config::BrowserAdapterConfig;
  use crate::families::browser::{BrowserAdapter, ChromiumDriver};

  let config: BrowserAdapterConfig = serde_json::from_value(source.config.clone()).ok()?;
  let driver = Box::new(ChromiumDriver::new(
    config.browser_binary.clone(),
    config.window_width,
    config.window_height,
    config.clear_cookies,
  ));
  Some(Box::new(BrowserAdapter::new(
    source.source_id.clone(),
    source.name.clone(),
    config,
    driver,
    i64::from(source.cache_ttl_seconds),
  )))
}

#[cfg(not(feature = "browser"))]
fn build_browser_adapter(_source: &Source, _runtime: Arc<FetchRuntime>) -> Option<Box<dyn SourceAdapter>> {
  None
}

/// Structural check for whether `source` has a compiled-in factory and a
/// config blob that parses for its family, without constructing a runtime or
/// an adapter instance. Used by the Registry at catalog load/refresh time to
/// decide whether a source stays ACTIVE or gets marked INACTIVE per the
/// "never an unmapped ACTIVE source" invariant (§8.1) — cheaper than calling
/// [`build_adapter`] since it never needs a [`FetchRuntime`].
pub fn has_adapter_factory(source: &Source) -> bool {
  let config_json = source.config.clone();
  match source.source_type {
    SourceType::Html => serde_json::from_value::<HtmlAdapterConfig>(config_json).is_ok(),
    SourceType::Api => serde_json::from_value::<JsonApiAdapterConfig>(config_json).is_ok(),
    SourceType::Rss => serde_json::from_value::<RssAdapterConfig>(config_json).is_ok(),
    SourceType::Browser => has_browser_factory(config_json),
    SourceType::Mixed => false,
  }
}

#[cfg(feature = "browser")]
fn has_browser_factory(config_json: serde_json::Value) -> bool {
  serde_json::from_value::<crate::config::BrowserAdapterConfig>(config_json).is_ok()
}

#[cfg(not(feature = "browser"))]
fn has_browser_factory(_config_json: serde_json::Value) -> bool {
  false
}
