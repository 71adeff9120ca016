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
pub enum FetchCommands {
  /// Fetch a single source by id
  One {
    source_id: String,
    #[arg(long)]
    force: bool,
  },

  /// Fetch every catalog source
  All {
    #[arg(long)]
    force: bool,
  },
}

pub async fn handle_fetch(cmd: FetchCommands, engine: &Engine) -> Result<()> {
  match cmd {
    FetchCommands::One { source_id, force } => {
      let items = engine.fetch_source(&source_id, force).await?;
      println!("{source_id}: {} new items", items.len());
    }
    FetchCommands::All { force } => {
      let results = engine.fetch_all(force).await;
      let mut failures = 0;
      for (source_id, result) in results {
        match result {
          Ok(items) => println!("{source_id}: {} new items", items.len()),
          Err(e) => {
            failures += 1;
            eprintln!("{source_id}: {e}");
          }
        }
      }
      if failures > 0 {
        println!("{failures} source(s) failed");
      }
    }
  }
  Ok(())
}
