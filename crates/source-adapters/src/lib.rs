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

//! # source-adapters
//!
//! The four source families (HTML, JSON-API, RSS/Atom, and feature-gated
//! Browser) that turn a `Source` row into `Vec<NewsItem>` (§4.2), plus the
//! compiled-in factory table that resolves a source's `SourceType` to a
//! constructor (§4.1).

pub mod adapter;
pub mod config;
pub mod dates;
pub mod families;
pub mod registry;
pub mod resilience;

pub use adapter::{AdapterCore, SourceAdapter};
pub use config::{
  BrowserAdapterConfig, HtmlAdapterConfig, HtmlSelectors, JsonApiAdapterConfig, JsonFieldMap,
  ResilienceConfig, RssAdapterConfig,
};
pub use families::html::HtmlAdapter;
pub use families::json_api::JsonApiAdapter;
pub use families::rss::RssAdapter;
#[cfg(feature = "browser")]
pub use families::browser::BrowserAdapter;
pub use registry::{build_adapter, has_adapter_factory};
