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

//! Date parsing shared by the HTML and JSON-API families (§4.2).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Resolves HTML-family relative timestamps ("5 minutes ago", "2 hours ago",
/// "yesterday 14:30", "14:30") against `now`, the adapter's local wall clock
/// at parse time.
pub fn parse_relative(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
  let text = text.trim().to_lowercase();

  if let Some(rest) = text.strip_suffix(" minutes ago").or_else(|| text.strip_suffix(" minute ago")) {
    let n: i64 = rest.trim().parse().ok()?;
    return Some(now - chrono::Duration::minutes(n));
  }
  if let Some(rest) = text.strip_suffix(" hours ago").or_else(|| text.strip_suffix(" hour ago")) {
    let n: i64 = rest.trim().parse().ok()?;
    return Some(now - chrono::Duration::hours(n));
  }
  if let Some(rest) = text.strip_suffix(" days ago").or_else(|| text.strip_suffix(" day ago")) {
    let n: i64 = rest.trim().parse().ok()?;
    return Some(now - chrono::Duration::days(n));
  }
  if let Some(rest) = text.strip_prefix("yesterday") {
    let time = NaiveTime::parse_from_str(rest.trim(), "%H:%M").ok()?;
    let yesterday = (now - chrono::Duration::days(1)).date();
    return Some(NaiveDateTime::new(yesterday, time));
  }
  if let Ok(time) = NaiveTime::parse_from_str(&text, "%H:%M") {
    return Some(NaiveDateTime::new(now.date(), time));
  }

  None
}

/// JSON-API date parsing order (§4.2): the configured format, then
/// ISO-8601 with `Z` swapped for `+00:00`, then RFC-1123, else give up.
pub fn parse_configured(text: &str, format: Option<&str>) -> Option<NaiveDateTime> {
  if let Some(format) = format {
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
      return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, format) {
      return Some(date.and_hms_opt(0, 0, 0).unwrap());
    }
  }

  let normalized = text.replace('Z', "+00:00");
  if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&normalized) {
    return Some(dt.naive_utc());
  }
  if let Ok(dt) = chrono::DateTime::parse_from_rfc2822(text) {
    return Some(dt.naive_utc());
  }

  None
}

#[cfg(test)]
mod tests {
  use super::*;

  fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 7, 28).unwrap().and_hms_opt(12, 0, 0).unwrap()
  }

  #[test]
  fn test_parse_relative_minutes_ago() {
    let parsed = parse_relative("5 minutes ago", now()).unwrap();
    assert_eq!(parsed, now() - chrono::Duration::minutes(5));
  }

  #[test]
  fn test_parse_relative_hours_ago() {
    let parsed = parse_relative("2 hours ago", now()).unwrap();
    assert_eq!(parsed, now() - chrono::Duration::hours(2));
  }

  #[test]
  fn test_parse_relative_yesterday() {
    let parsed = parse_relative("yesterday 14:30", now()).unwrap();
    assert_eq!(parsed.time(), NaiveTime::from_hms_opt(14, 30, 0).unwrap());
    assert_eq!(parsed.date(), (now() - chrono::Duration::days(1)).date());
  }

  #[test]
  fn test_parse_relative_bare_time() {
    let parsed = parse_relative("09:15", now()).unwrap();
    assert_eq!(parsed.date(), now().date());
    assert_eq!(parsed.time(), NaiveTime::from_hms_opt(9, 15, 0).unwrap());
  }

  #[test]
  fn test_parse_relative_unrecognized_returns_none() {
    assert!(parse_relative("sometime last week", now()).is_none());
  }

  #[test]
  fn test_parse_configured_iso8601_z() {
    let parsed = parse_configured("2026-07-28T10:00:00Z", None).unwrap();
    assert_eq!(parsed.date(), now().date());
  }

  #[test]
  fn test_parse_configured_rfc1123() {
    let parsed = parse_configured("Tue, 28 Jul 2026 10:00:00 GMT", None);
    assert!(parsed.is_some());
  }

  #[test]
  fn test_parse_configured_custom_format() {
    let parsed = parse_configured("28/07/2026", Some("%d/%m/%Y")).unwrap();
    assert_eq!(parsed.date(), now().date());
  }

  #[test]
  fn test_parse_configured_gives_up() {
    assert!(parse_configured("not a date", None).is_none());
  }
}
