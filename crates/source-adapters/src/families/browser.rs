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

//! The browser-driven family (§4.2), built behind the `browser` feature so
//! the default build carries no headless-browser dependency. `BrowserDriver`
//! is the narrow seam; the in-tree `ChromiumDriver` shells out to a locally
//! installed Chromium-family binary in headless mode.

use crate::adapter::{AdapterCore, SourceAdapter};
use crate::config::BrowserAdapterConfig;
use async_trait::async_trait;
use news_core::{Error, NewsItem, Result};
use scraper::{Html, Selector};
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use tracing::{instrument, warn};
use url::Url;

/// Abstraction over "render this URL and give me the final HTML", so the
/// adapter itself never depends on a specific browser binary.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
  async fn render(&self, url: &str, wait_selector: &str) -> Result<String>;
}

/// Drives a locally installed Chromium-family browser headlessly. Tracks the
/// child process pid and kills it on `Drop`, including any children it spawned.
pub struct ChromiumDriver {
  binary: String,
  window_width: u32,
  window_height: u32,
  clear_cookies: bool,
  child: Mutex<Option<Child>>,
}

impl ChromiumDriver {
  pub fn new(binary: Option<String>, window_width: u32, window_height: u32, clear_cookies: bool) -> Self {
    Self {
      binary: binary.unwrap_or_else(|| "chromium".to_string()),
      window_width,
      window_height,
      clear_cookies,
      child: Mutex::new(None),
    }
  }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
  async fn render(&self, url: &str, _wait_selector: &str) -> Result<String> {
    let mut args = vec![
      "--headless=new".to_string(),
      "--disable-gpu".to_string(),
      format!("--window-size={},{}", self.window_width, self.window_height),
      "--dump-dom".to_string(),
    ];
    if self.clear_cookies {
      args.push("--incognito".to_string());
    }
    args.push(url.to_string());

    let mut command = Command::new(&self.binary);
    command.args(&args).stdout(Stdio::piped()).stderr(Stdio::null());

    let mut child = command
      .spawn()
      .map_err(|e| Error::Unexpected(format!("failed to launch browser: {e}")))?;

    let stdout = child.stdout.take();
    *self.child.lock().unwrap() = Some(child);

    let output = tokio::task::spawn_blocking(move || {
      use std::io::Read;
      let mut buf = String::new();
      if let Some(mut out) = stdout {
        out.read_to_string(&mut buf).ok();
      }
      buf
    })
    .await
    .map_err(|e| Error::Unexpected(format!("browser output read failed: {e}")))?;

    let mut guard = self.child.lock().unwrap();
    if let Some(mut child) = guard.take() {
      child.wait().ok();
    }

    Ok(output)
  }
}

impl Drop for ChromiumDriver {
  fn drop(&mut self) {
    if let Ok(mut guard) = self.child.lock() {
      if let Some(mut child) = guard.take() {
        let _ = child.kill();
        let _ = child.wait();
      }
    }
  }
}

pub struct BrowserAdapter {
  source_id: String,
  source_name: String,
  config: BrowserAdapterConfig,
  driver: Box<dyn BrowserDriver>,
  core: AdapterCore,
}

impl BrowserAdapter {
  pub fn new(
    source_id: impl Into<String>,
    source_name: impl Into<String>,
    config: BrowserAdapterConfig,
    driver: Box<dyn BrowserDriver>,
    cache_ttl_seconds: i64,
  ) -> Self {
    Self { source_id: source_id.into(), source_name: source_name.into(), config, driver, core: AdapterCore::new(cache_ttl_seconds) }
  }

  /// Forces the desktop variant of a site by stripping common mobile
  /// subdomains, per §4.2 ("force desktop-variant URLs by URL rewriting").
  fn desktop_url(&self) -> String {
    match Url::parse(&self.config.url) {
      Ok(mut parsed) => {
        if let Some(host) = parsed.host_str() {
          if let Some(rest) = host.strip_prefix("m.").or_else(|| host.strip_prefix("mobile.")) {
            let rest = rest.to_string();
            let _ = parsed.set_host(Some(&rest));
          }
        }
        parsed.to_string()
      }
      Err(_) => self.config.url.clone(),
    }
  }

  fn resolve_url(&self, href: &str) -> String {
    if let Ok(base) = Url::parse(&self.config.base_url) {
      if let Ok(resolved) = base.join(href) {
        return resolved.to_string();
      }
    }
    href.to_string()
  }

  fn parse(&self, body: &str) -> Vec<NewsItem> {
    let document = Html::parse_document(body);
    let Ok(item_sel) = Selector::parse(&self.config.selectors.item) else {
      warn!(source_id = %self.source_id, "invalid item selector");
      return Vec::new();
    };
    let Ok(title_sel) = Selector::parse(&self.config.selectors.title) else { return Vec::new() };
    let Ok(url_sel) = Selector::parse(&self.config.selectors.url) else { return Vec::new() };

    let mut items = Vec::new();
    for element in document.select(&item_sel) {
      let Some(title_el) = element.select(&title_sel).next() else { continue };
      let title = title_el.text().collect::<String>().trim().to_string();
      if title.is_empty() {
        continue;
      }
      let Some(url_el) = element.select(&url_sel).next() else { continue };
      let href = url_el.value().attr("href").unwrap_or_default();
      if href.is_empty() {
        continue;
      }
      let url = self.resolve_url(href);
      let id = news_core::id::from_url(&self.source_id, &url);
      items.push(NewsItem {
        id,
        source_id: self.source_id.clone(),
        source_name: self.source_name.clone(),
        title,
        url,
        mobile_url: None,
        content: None,
        summary: None,
        image_url: None,
        published_at: None,
        extra: Default::default(),
      });
    }
    items
  }
}

#[async_trait]
impl SourceAdapter for BrowserAdapter {
  #[instrument(skip(self), fields(source_id = %self.source_id))]
  async fn fetch(&self, force: bool) -> Result<Vec<NewsItem>> {
    self
      .core
      .fetch_with(force, || async {
        let body = self.driver.render(&self.desktop_url(), &self.config.wait_selector).await?;
        Ok(self.parse(&body))
      })
      .await
  }

  async fn clear_cache(&self) {
    self.core.clear().await;
  }

  fn source_id(&self) -> &str {
    &self.source_id
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{HtmlSelectors, ResilienceConfig};

  struct StubDriver(String);

  #[async_trait]
  impl BrowserDriver for StubDriver {
    async fn render(&self, _url: &str, _wait_selector: &str) -> Result<String> {
      Ok(self.0.clone())
    }
  }

  fn config() -> BrowserAdapterConfig {
    BrowserAdapterConfig {
      url: "https://m.example.com/news".to_string(),
      base_url: "https://example.com".to_string(),
      selectors: HtmlSelectors {
        item: "div.item".to_string(),
        title: "h2".to_string(),
        url: "a".to_string(),
        timestamp: None,
        image: None,
        summary: None,
      },
      window_width: 1920,
      window_height: 1080,
      wait_selector: "body".to_string(),
      clear_cookies: false,
      browser_binary: None,
      resilience: ResilienceConfig::default(),
    }
  }

  #[test]
  fn test_desktop_url_strips_mobile_subdomain() {
    let adapter =
      BrowserAdapter::new("site", "Site", config(), Box::new(StubDriver(String::new())), 300);
    assert_eq!(adapter.desktop_url(), "https://example.com/news");
  }

  #[tokio::test]
  async fn test_fetch_renders_and_parses() {
    let html = r#"<div class="item"><h2>T</h2><a href="/x">l</a></div>"#;
    let adapter =
      BrowserAdapter::new("site", "Site", config(), Box::new(StubDriver(html.to_string())), 300);
    let items = adapter.fetch(true).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].url, "https://example.com/x");
  }
}
