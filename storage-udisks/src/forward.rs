// SPDX-License-Identifier: GPL-3.0-only

//! Turns ordered bus signals into raw notifications.

use std::collections::HashMap;
use std::pin::pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use storage_contracts::NotificationSender;
use storage_types::{DeviceDescription, RawNotification};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use zbus::Connection;

use crate::describe::describe_block;
use crate::error::DiskError;
use crate::manager::{BLOCK_IFACE, UDisks2ManagerProxy, is_block_object, touches_description};
use crate::signal::BusSignal;

/// Read access to the block devices UDisks2 knows about.
#[async_trait]
pub trait BlockDirectory: Send + Sync {
    async fn block_devices(&self) -> Result<Vec<String>, DiskError>;

    async fn describe(&self, object_path: &str) -> Result<DeviceDescription, DiskError>;
}

pub struct UDisksDirectory {
    connection: Connection,
}

impl UDisksDirectory {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl BlockDirectory for UDisksDirectory {
    async fn block_devices(&self) -> Result<Vec<String>, DiskError> {
        let manager = UDisks2ManagerProxy::new(&self.connection).await?;
        let paths = manager.get_block_devices(HashMap::new()).await?;
        Ok(paths.into_iter().map(|path| path.to_string()).collect())
    }

    async fn describe(&self, object_path: &str) -> Result<DeviceDescription, DiskError> {
        describe_block(&self.connection, object_path).await
    }
}

fn names_block(interfaces: &[String]) -> bool {
    interfaces.iter().any(|interface| interface == BLOCK_IFACE)
}

pub struct Forwarder<D> {
    directory: D,
    sender: NotificationSender,
}

impl<D: BlockDirectory> Forwarder<D> {
    pub fn new(directory: D, sender: NotificationSender) -> Self {
        Self { directory, sender }
    }

    /// Announce existing devices, then forward `signals` one at a time.
    ///
    /// Returns when cancelled, when `signals` ends or when the receiver is gone.
    pub async fn run<S>(&self, signals: S, cancel: CancellationToken)
    where
        S: Stream<Item = BusSignal>,
    {
        let mut signals = pin!(signals);

        let announced = tokio::select! {
            biased;

            _ = cancel.cancelled() => false,
            announced = self.announce_existing() => announced,
        };

        if announced {
            loop {
                let signal = tokio::select! {
                    biased;

                    _ = cancel.cancelled() => break,
                    signal = signals.next() => signal,
                };

                let Some(signal) = signal else {
                    break;
                };
                if !self.forward(signal).await {
                    break;
                }
            }
        }

        debug!("UDisks2 notification forwarding stopped");
    }

    /// Returns false once the receiving side is gone.
    pub async fn forward(&self, signal: BusSignal) -> bool {
        match signal {
            BusSignal::InterfacesAdded {
                object_path,
                interfaces,
            } if names_block(&interfaces) => self.describe_and_send(object_path, false).await,
            BusSignal::InterfacesRemoved {
                object_path,
                interfaces,
            } if names_block(&interfaces) => {
                self.send(RawNotification::Removed { object_path }).await
            }
            BusSignal::PropertiesChanged {
                object_path,
                interface,
                changed,
                invalidated,
            } if interface == BLOCK_IFACE
                && is_block_object(&object_path)
                && touches_description(&changed, &invalidated) =>
            {
                self.describe_and_send(object_path, true).await
            }
            _ => true,
        }
    }

    async fn send(&self, notification: RawNotification) -> bool {
        if let Err(e) = self.sender.send(notification).await {
            warn!("Device event receiver dropped: {e}");
            return false;
        }
        true
    }

    async fn describe_and_send(&self, object_path: String, changed: bool) -> bool {
        let description = match self.directory.describe(&object_path).await {
            Ok(description) => description,
            Err(e) => {
                // Usually a device that vanished again before it could be queried.
                warn!("Dropping notification for {object_path}: {e}");
                return true;
            }
        };

        let notification = if changed {
            RawNotification::Changed {
                object_path,
                description,
            }
        } else {
            RawNotification::Added {
                object_path,
                description,
            }
        };
        self.send(notification).await
    }

    async fn announce_existing(&self) -> bool {
        let block_paths = match self.directory.block_devices().await {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Could not enumerate existing block devices: {e}");
                return true;
            }
        };

        debug!("Announcing {} existing block devices", block_paths.len());
        for path in block_paths {
            if !self.describe_and_send(path, false).await {
                return false;
            }
        }
        true
    }
}
