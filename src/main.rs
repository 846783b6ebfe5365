mod cli;
mod config;
mod cue;
mod error;
mod format;
mod logging;
mod metrics;
mod model;
mod orchestrator;
mod storage;
mod text_summary;
mod timer;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = args.json || args.text;

    cli::run(args).await?;

    // Leave promptly in headless modes; a cue may still be playing on the blocking pool.
    if is_non_tui {
        std::process::exit(0);
    }
    Ok(())
}
