// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for the storage link daemon
//!
//! These models are shared by every layer of the stack:
//!
//! - **storage-udisks**: produces [`RawNotification`]s carrying a [`DeviceDescription`]
//! - **storage-links**: normalizes them into [`DeviceEvent`]s and maintains link trees
//! - **storage-service**: wires sources and handlers together
//!
//! Raw notifications keep the shape the device subsystem reports (C byte strings,
//! empty strings for unknown values). Everything past the dispatcher works on the
//! normalized [`Device`] only.

pub mod bytestring;
pub mod device;
pub mod event;
pub mod scheme;

pub use bytestring::decode_c_string_bytes;
pub use device::{Device, DeviceDescription, DeviceId};
pub use event::{DeviceEvent, DeviceEventKind, RawNotification};
pub use scheme::LinkScheme;
