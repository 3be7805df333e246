// SPDX-License-Identifier: GPL-3.0-only

//! Contract between device notification subsystems and the link engine.
//!
//! A [`DeviceEventSource`] hands out a [`DeviceEventStream`] of
//! [`storage_types::RawNotification`]s. Sources are expected to report devices
//! that already exist before reporting live changes.

pub mod error;
pub mod source;
pub mod stream;

pub use error::SourceError;
pub use source::DeviceEventSource;
pub use stream::{DeviceEventStream, NotificationSender};
