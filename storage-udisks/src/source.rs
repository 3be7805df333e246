// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;
use futures_util::StreamExt;
use storage_contracts::{DeviceEventSource, DeviceEventStream, SourceError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use zbus::Connection;

use crate::error::DiskError;
use crate::forward::{Forwarder, UDisksDirectory};
use crate::signal::{BusSignal, udisks_signal_stream};

const DEFAULT_CAPACITY: usize = 64;

/// Device event source backed by UDisks2 on the system bus.
pub struct UDisksEventSource {
    connection: Connection,
    capacity: usize,
    subscription: Option<Subscription>,
}

struct Subscription {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl UDisksEventSource {
    pub async fn new() -> Result<Self, DiskError> {
        let connection = Connection::system()
            .await
            .map_err(|e| DiskError::ConnectionFailed(e.to_string()))?;
        Ok(Self::with_connection(connection))
    }

    pub fn with_connection(connection: Connection) -> Self {
        Self {
            connection,
            capacity: DEFAULT_CAPACITY,
            subscription: None,
        }
    }
}

#[async_trait]
impl DeviceEventSource for UDisksEventSource {
    fn name(&self) -> &str {
        "udisks2"
    }

    async fn subscribe(&mut self) -> Result<DeviceEventStream, SourceError> {
        if self.subscription.is_some() {
            return Err(SourceError::AlreadySubscribed(self.name().to_string()));
        }

        // The signal stream is opened before enumerating so that nothing added
        // in between is missed. A device seen twice is harmless to the linkers.
        let messages = udisks_signal_stream(&self.connection).await?;

        let (sender, stream) = DeviceEventStream::channel(self.capacity);
        let forwarder = Forwarder::new(UDisksDirectory::new(self.connection.clone()), sender);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let signals = messages.filter_map(|message| async move {
                let message = match message {
                    Ok(message) => message,
                    Err(e) => {
                        warn!("UDisks2 signal stream error: {e}");
                        return None;
                    }
                };
                BusSignal::from_message(&message).unwrap_or_else(|e| {
                    warn!("Failed to parse UDisks2 signal: {e}");
                    None
                })
            });
            forwarder.run(signals, token).await;
        });

        self.subscription = Some(Subscription { cancel, task });
        info!("Subscribed to UDisks2 block device notifications");
        Ok(stream)
    }

    async fn unsubscribe(&mut self) -> Result<(), SourceError> {
        let Some(subscription) = self.subscription.take() else {
            return Ok(());
        };

        subscription.cancel.cancel();
        if let Err(e) = subscription.task.await
            && e.is_panic()
        {
            warn!("UDisks2 forwarding task panicked: {e}");
        }

        info!("Unsubscribed from UDisks2 block device notifications");
        Ok(())
    }
}
