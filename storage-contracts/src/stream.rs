// SPDX-License-Identifier: GPL-3.0-only

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::Stream;
use storage_types::RawNotification;
use tokio::sync::mpsc;

pub type NotificationSender = mpsc::Sender<RawNotification>;

/// Receiving half of a source subscription.
pub struct DeviceEventStream {
    receiver: mpsc::Receiver<RawNotification>,
}

impl DeviceEventStream {
    /// Create a bounded channel; the sender side belongs to the source.
    pub fn channel(capacity: usize) -> (NotificationSender, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, Self { receiver })
    }

    /// Receive the next notification, `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<RawNotification> {
        self.receiver.recv().await
    }

    /// Stop accepting notifications; already buffered ones can still be received.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

impl Stream for DeviceEventStream {
    type Item = RawNotification;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
