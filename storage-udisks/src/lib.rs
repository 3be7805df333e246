// SPDX-License-Identifier: GPL-3.0-only

//! UDisks2-backed device event source.
//!
//! Watches the UDisks2 object manager on the system bus for block devices
//! being added or removed, and the block interface's `PropertiesChanged`
//! signal for description updates (a filesystem UUID becoming known after
//! the device appeared, for example). All three arrive on one stream and are
//! forwarded in bus order.

pub mod describe;
pub mod error;
pub mod forward;
pub mod manager;
pub mod signal;
pub mod source;

pub use describe::describe_block;
pub use error::DiskError;
pub use forward::{BlockDirectory, Forwarder, UDisksDirectory};
pub use manager::UDisks2ManagerProxy;
pub use signal::BusSignal;
pub use source::UDisksEventSource;
