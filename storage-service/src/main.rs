// SPDX-License-Identifier: GPL-3.0-only

//! storage-linkd - mirrors attached storage devices into symlink trees
//!
//! Watches UDisks2 for block devices coming and going and keeps
//! `<base>/by-path`, `<base>/by-uuid` and `<base>/by-serial` in step with them.

use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod daemon;
mod error;
mod logging;
mod shutdown;

use cli::Cli;
use config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    logging::init(config.log_level);
    tracing::info!("Starting storage-linkd v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Configuration: {:?}", config);

    daemon::run(config).await?;

    tracing::info!("storage-linkd shutting down");
    Ok(())
}
