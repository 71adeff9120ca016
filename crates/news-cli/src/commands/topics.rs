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

//! Reads against the in-memory Aggregator: hot clusters, by-category
//! clusters, and free-text search over deduplicated items.

use anyhow::Result;
use clap::Subcommand;
use news_engine::Engine;

#[derive(Subcommand, Debug)]
pub enum TopicsCommands {
  /// Top clusters by hot-score
  Hot {
    #[arg(long, default_value_t = 10)]
    limit: usize,
  },

  /// Top clusters within a category
  Category {
    category: String,
    #[arg(long, default_value_t = 10)]
    limit: usize,
  },

  /// Free-text search over deduplicated items
  Search {
    query: String,
    #[arg(long, default_value_t = 20)]
    max_results: usize,
  },
}

pub async fn handle_topics(cmd: TopicsCommands, engine: &Engine) -> Result<()> {
  match cmd {
    TopicsCommands::Hot { limit } => {
      for view in engine.hot(limit) {
        println!(
          "[{:.3}] {} ({} related, {} sources)",
          view.score, view.main.title, view.related_count, view.sources_count
        );
      }
    }
    TopicsCommands::Category { category, limit } => {
      for view in engine.by_category(&category, limit) {
        println!("[{:.3}] {}", view.score, view.main.title);
      }
    }
    TopicsCommands::Search { query, max_results } => {
      for item in engine.search(&query, max_results) {
        println!("{}\t{}", item.source_id, item.title);
      }
    }
  }
  Ok(())
}
