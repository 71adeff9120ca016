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
pub enum CatalogCommands {
  /// Reload the catalog from the metadata store (or the compiled-in fallback)
  Load,

  /// Re-read the store and diff against what's currently loaded
  Refresh,

  /// List sources, optionally filtered
  List {
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    language: Option<String>,
  },
}

pub async fn handle_catalog(cmd: CatalogCommands, engine: &Engine) -> Result<()> {
  match cmd {
    CatalogCommands::Load => {
      engine.load_catalog().await?;
      println!("catalog loaded: {} sources", engine.registry.all().len());
    }
    CatalogCommands::Refresh => {
      engine.refresh_catalog().await?;
      println!("catalog refreshed: {} sources", engine.registry.all().len());
    }
    CatalogCommands::List { category, country, language } => {
      let sources = match (category, country, language) {
        (Some(category), _, _) => engine.registry.by_category(&category),
        (_, Some(country), _) => engine.registry.by_country(&country),
        (_, _, Some(language)) => engine.registry.by_language(&language),
        _ => engine.registry.all(),
      };
      for source in sources {
        println!("{}\t{}\t{}", source.source_id, source.name, source.status);
      }
    }
  }
  Ok(())
}
