// SPDX-License-Identifier: GPL-3.0-only

//! Error types for UDisks2 access

use storage_contracts::SourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiskError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Failed to query {object_path}: {reason}")]
    Query { object_path: String, reason: String },

    #[error("Zbus Error: {0}")]
    ZbusError(#[from] zbus::Error),
}

impl From<DiskError> for SourceError {
    fn from(err: DiskError) -> Self {
        match err {
            DiskError::ConnectionFailed(msg) => SourceError::Connection(msg),
            DiskError::Query {
                object_path,
                reason,
            } => SourceError::Describe {
                object_path,
                reason,
            },
            other => SourceError::Connection(other.to_string()),
        }
    }
}
