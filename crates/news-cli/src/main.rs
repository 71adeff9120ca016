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
use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod commands;
mod config;
mod setup;

use commands::cache::{handle_cache, CacheCommands};
use commands::catalog::{handle_catalog, CatalogCommands};
use commands::fetch::{handle_fetch, FetchCommands};
use commands::stats::handle_stats;
use commands::topics::{handle_topics, TopicsCommands};

/// Exit codes for any CLI frontend (per the engine's external-interface
/// contract): 0 success, 1 generic error, 2 configuration error, 3
/// catalog-load error.
const EXIT_OK: u8 = 0;
const EXIT_GENERIC_ERROR: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_CATALOG_ERROR: u8 = 3;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "newsflux")]
#[command(propagate_version = true)]
struct Cli {
  #[command(subcommand)]
  command: Commands,

  /// Verbose output
  #[arg(short, long, global = true)]
  verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
  Catalog {
    #[command(subcommand)]
    cmd: CatalogCommands,
  },
  Fetch {
    #[command(subcommand)]
    cmd: FetchCommands,
  },
  Cache {
    #[command(subcommand)]
    cmd: CacheCommands,
  },
  Topics {
    #[command(subcommand)]
    cmd: TopicsCommands,
  },
  /// Flush accumulated stats to the metadata store
  Stats,
}

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();

  let config = match config::Config::from_env(cli.verbose) {
    Ok(config) => config,
    Err(err) => {
      eprintln!("configuration error: {err:#}");
      return ExitCode::from(EXIT_CONFIG_ERROR);
    }
  };
  tracing_subscriber::fmt().with_env_filter(config.log_level.clone()).init();

  let engine = match setup::build_engine(&config).await {
    Ok(engine) => engine,
    Err(err) => {
      eprintln!("configuration error: {err:#}");
      return ExitCode::from(EXIT_CONFIG_ERROR);
    }
  };

  if let Err(err) = engine.load_catalog().await {
    eprintln!("catalog-load error: {err:#}");
    return ExitCode::from(EXIT_CATALOG_ERROR);
  }

  match run(cli.command, &engine).await {
    Ok(()) => ExitCode::from(EXIT_OK),
    Err(err) => {
      eprintln!("error: {err:#}");
      ExitCode::from(EXIT_GENERIC_ERROR)
    }
  }
}

async fn run(command: Commands, engine: &news_engine::Engine) -> Result<()> {
  match command {
    Commands::Catalog { cmd } => handle_catalog(cmd, engine).await?,
    Commands::Fetch { cmd } => handle_fetch(cmd, engine).await?,
    Commands::Cache { cmd } => handle_cache(cmd, engine).await?,
    Commands::Topics { cmd } => handle_topics(cmd, engine).await?,
    Commands::Stats => handle_stats(engine).await?,
  }

  Ok(())
}
