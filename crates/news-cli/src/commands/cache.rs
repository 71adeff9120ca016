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

use anyhow::Result;
use clap::Subcommand;
use news_engine::Engine;

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
  /// Inspect a single cache key
  Inspect { key: String },

  /// Delete cache entries matching a glob pattern
  Clear { pattern: String },

  /// Print hit/miss/key counts for the in-process memory tier
  Stats,
}

pub async fn handle_cache(cmd: CacheCommands, engine: &Engine) -> Result<()> {
  match cmd {
    CacheCommands::Inspect { key } => match engine.cache_get(&key).await? {
      Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
      None => println!("(no entry for {key})"),
    },
    CacheCommands::Clear { pattern } => {
      let deleted = engine.cache_clear(&pattern).await?;
      println!("cleared {deleted} key(s) matching {pattern}");
    }
    CacheCommands::Stats => {
      let stats = engine.cache_stats();
      println!("hits={} misses={} keys={}", stats.hits, stats.misses, stats.total_keys);
    }
  }
  Ok(())
}
