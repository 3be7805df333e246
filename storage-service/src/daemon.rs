// SPDX-License-Identifier: GPL-3.0-only

//! Handler wiring and the main run loop.

use std::io;

use anyhow::Result;
use storage_contracts::DeviceEventSource;
use storage_links::{Dispatcher, HandlerError, InfoLogger, Linker};
use storage_types::LinkScheme;
use storage_udisks::UDisksEventSource;
use tracing::info;

use crate::config::Config;
use crate::shutdown;

/// One linker per scheme, creating each managed directory.
pub fn build_linkers(config: &Config) -> Result<Vec<Linker>, HandlerError> {
    LinkScheme::ALL
        .iter()
        .map(|scheme| Linker::new(*scheme, config.scheme_dir(*scheme), config.linker_options()))
        .collect()
}

/// Register the event printer followed by the by-path, by-uuid and by-serial linkers.
pub fn register_handlers<S: DeviceEventSource>(
    dispatcher: &mut Dispatcher<S>,
    config: &Config,
) -> Result<()> {
    dispatcher.add_handler(InfoLogger::new(io::stdout(), config.verbose))?;
    for linker in build_linkers(config)? {
        info!("Maintaining {}", linker.dir().display());
        dispatcher.add_handler(linker)?;
    }
    Ok(())
}

/// Run `dispatcher` until a shutdown signal arrives or its source fails.
pub async fn serve<S: DeviceEventSource>(mut dispatcher: Dispatcher<S>) -> Result<()> {
    let listener = shutdown::listen(dispatcher.stop_handle())?;

    dispatcher.start().await?;
    info!(
        "Watching {} with handlers: {}",
        dispatcher.source().name(),
        dispatcher.handler_names().join(", ")
    );

    let result = dispatcher.run().await;
    listener.abort();
    result?;

    info!("Event loop finished");
    Ok(())
}

pub async fn run(config: Config) -> Result<()> {
    let source = UDisksEventSource::new().await?;
    let mut dispatcher = Dispatcher::new(source);
    register_handlers(&mut dispatcher, &config)?;
    serve(dispatcher).await
}
