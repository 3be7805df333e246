// SPDX-License-Identifier: GPL-3.0-only

//! Event dispatch and link maintenance.
//!
//! A [`Dispatcher`] owns the subscription to a
//! [`storage_contracts::DeviceEventSource`], normalizes every raw notification
//! into a [`storage_types::DeviceEvent`] and hands it to each registered
//! [`EventHandler`] in registration order. A [`Linker`] keeps one directory of
//! symlinks in step with the live device set under one [`storage_types::LinkScheme`];
//! the [`InfoLogger`] prints events.
//!
//! Handlers run one at a time on the dispatcher's task, so linkers own their
//! directory and table without any locking.

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod linker;
pub mod logger;
pub mod normalize;

pub use dispatcher::{DispatchReport, Dispatcher, StopHandle};
pub use error::{DispatchError, HandlerError, HandlerFailure, LinkOp};
pub use handler::EventHandler;
pub use linker::{LinkEntry, LinkTable, Linker, LinkerOptions, derive_key};
pub use logger::InfoLogger;
pub use normalize::normalize;
