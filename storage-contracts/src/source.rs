// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use crate::{DeviceEventStream, SourceError};

/// Subscription to device appear/disappear/change notifications.
#[async_trait]
pub trait DeviceEventSource: Send {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Start delivering notifications.
    ///
    /// Devices present at subscription time are reported as `Added` before any
    /// live notification. Fails with [`SourceError::AlreadySubscribed`] when a
    /// subscription is active.
    async fn subscribe(&mut self) -> Result<DeviceEventStream, SourceError>;

    /// Stop delivering notifications. Idempotent.
    async fn unsubscribe(&mut self) -> Result<(), SourceError>;
}
