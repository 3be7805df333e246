// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;
use std::io;
use std::path::PathBuf;

use storage_contracts::SourceError;
use thiserror::Error;

/// Filesystem operation performed by a linker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOp {
    CreateDir,
    Scan,
    Create,
    Rename,
    Remove,
}

impl fmt::Display for LinkOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::CreateDir => "create directory",
            Self::Scan => "scan",
            Self::Create => "create",
            Self::Rename => "rename",
            Self::Remove => "remove",
        };
        f.write_str(op)
    }
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Link operation failed: {op} {path}: {source}")]
    LinkOperationFailed {
        op: LinkOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Output sink error: {0}")]
    Sink(#[from] io::Error),

    #[error("Handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    pub(crate) fn link(op: LinkOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::LinkOperationFailed {
            op,
            path: path.into(),
            source,
        }
    }
}

/// One handler failing on one event.
#[derive(Debug, Error)]
#[error("Handler {handler} failed: {error}")]
pub struct HandlerFailure {
    pub handler: String,
    #[source]
    pub error: HandlerError,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Dispatcher is already running")]
    AlreadyRunning,

    #[error("Handlers must be registered before the dispatcher starts")]
    RegistrationClosed,

    #[error("Dispatcher has not been started")]
    NotStarted,

    #[error("Dispatcher has already stopped")]
    Stopped,

    #[error("Device event source error: {0}")]
    Source(#[from] SourceError),
}
