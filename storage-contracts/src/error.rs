// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Source {0} is already subscribed")]
    AlreadySubscribed(String),

    #[error("Failed to describe {object_path}: {reason}")]
    Describe { object_path: String, reason: String },

    #[error("Notification channel closed")]
    Closed,
}
