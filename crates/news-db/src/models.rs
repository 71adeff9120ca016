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

//! Diesel row types, and the conversions between them and the shared domain
//! types in `news_core`/`news_client`.

use crate::schema::{proxy_configs, source_stats, sources};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use news_client::{ProxyConfig, ProxyStatus};
use news_core::{Error, Result, Source, SourceStatus, SourceType};

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = sources)]
pub struct SourceRow {
  pub source_id: String,
  pub name: String,
  pub description: Option<String>,
  pub source_type: String,
  pub status: String,
  pub update_interval_seconds: i32,
  pub cache_ttl_seconds: i32,
  pub category: Option<String>,
  pub country: Option<String>,
  pub language: Option<String>,
  pub config: serde_json::Value,
  pub needs_proxy: bool,
  pub proxy_group: Option<String>,
  pub last_updated: Option<DateTime<Utc>>,
  pub last_error: Option<String>,
  pub news_count: i32,
}

impl SourceRow {
  pub fn from_source(source: &Source) -> Self {
    Self {
      source_id: source.source_id.clone(),
      name: source.name.clone(),
      description: source.description.clone(),
      source_type: source.source_type.to_string(),
      status: source.status.to_string(),
      update_interval_seconds: source.update_interval_seconds,
      cache_ttl_seconds: source.cache_ttl_seconds,
      category: source.category.clone(),
      country: source.country.clone(),
      language: source.language.clone(),
      config: source.config.clone(),
      needs_proxy: source.needs_proxy,
      proxy_group: source.proxy_group.clone(),
      last_updated: source.last_updated.map(|t| t.and_utc()),
      last_error: source.last_error.clone(),
      news_count: source.news_count,
    }
  }

  pub fn into_source(self) -> Result<Source> {
    Ok(Source {
      source_id: self.source_id,
      name: self.name,
      description: self.description,
      source_type: SourceType::from_str_loose(&self.source_type)
        .ok_or_else(|| Error::Config(format!("unknown source_type: {}", self.source_type)))?,
      category: self.category,
      country: self.country,
      language: self.language,
      update_interval_seconds: self.update_interval_seconds,
      cache_ttl_seconds: self.cache_ttl_seconds,
      status: SourceStatus::from_str_loose(&self.status)
        .ok_or_else(|| Error::Config(format!("unknown status: {}", self.status)))?,
      config: self.config,
      needs_proxy: self.needs_proxy,
      proxy_group: self.proxy_group,
      last_updated: self.last_updated.map(|t| t.naive_utc()),
      last_error: self.last_error,
      news_count: self.news_count,
    })
  }
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = source_stats)]
pub struct SourceStatRow {
  pub id: i64,
  pub source_id: String,
  pub api_type: String,
  pub success_rate: f64,
  pub avg_response_time: f64,
  pub last_response_time: f64,
  pub total_requests: i64,
  pub error_count: i64,
  pub news_count: i64,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = source_stats)]
pub struct NewSourceStatRow {
  pub source_id: String,
  pub api_type: String,
  pub success_rate: f64,
  pub avg_response_time: f64,
  pub last_response_time: f64,
  pub total_requests: i64,
  pub error_count: i64,
  pub news_count: i64,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = proxy_configs)]
pub struct ProxyConfigRow {
  pub id: i32,
  pub name: String,
  pub protocol: String,
  pub host: String,
  pub port: i32,
  pub username: Option<String>,
  pub password: Option<String>,
  pub proxy_group: String,
  pub status: String,
  pub priority: i32,
  pub avg_response_time: Option<f64>,
  pub last_check_time: Option<DateTime<Utc>>,
  pub last_error: Option<String>,
}

impl ProxyConfigRow {
  pub fn into_proxy_config(self) -> Result<ProxyConfig> {
    let status = match self.status.as_str() {
      "ACTIVE" => ProxyStatus::Active,
      "ERROR" => ProxyStatus::Error,
      other => return Err(Error::Config(format!("unknown proxy status: {other}"))),
    };
    Ok(ProxyConfig {
      id: self.id,
      name: self.name,
      protocol: self.protocol,
      host: self.host,
      port: self.port,
      username: self.username,
      password: self.password,
      proxy_group: self.proxy_group,
      status,
      priority: self.priority,
      avg_response_time: self.avg_response_time,
      last_check_time: self.last_check_time.map(|t| t.naive_utc()),
      last_error: self.last_error,
    })
  }
}

pub(crate) fn proxy_status_to_db(status: ProxyStatus) -> &'static str {
  match status {
    ProxyStatus::Active => "ACTIVE",
    ProxyStatus::Error => "ERROR",
  }
}
