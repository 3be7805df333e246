// SPDX-License-Identifier: GPL-3.0-only

use std::io;

use storage_links::StopHandle;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;
use tracing::info;

/// Translate SIGINT and SIGTERM into a stop request.
///
/// Both signals are registered before this returns, so their default actions
/// no longer apply. The listener ends on its own once `stop` fires.
pub fn listen(stop: StopHandle) -> io::Result<JoinHandle<()>> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("Received SIGINT, shutting down"),
            _ = terminate.recv() => info!("Received SIGTERM, shutting down"),
            _ = stop.stopped() => return,
        }
        stop.stop();
    }))
}
