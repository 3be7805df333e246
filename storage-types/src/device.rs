// SPDX-License-Identifier: GPL-3.0-only

//! Device identity and attribute models

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::decode_c_string_bytes;

/// Opaque identity assigned by the device subsystem.
///
/// Stable for the lifetime of one attachment. For UDisks2 this is the block
/// object path (e.g. `/org/freedesktop/UDisks2/block_devices/sda1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A live storage object, normalized from a [`DeviceDescription`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    // === Identity ===
    pub id: DeviceId,

    /// Device node path (e.g., "/dev/sda1")
    pub path: PathBuf,

    // === Stable attributes ===
    /// Filesystem or partition UUID, when known
    pub uuid: Option<String>,

    /// Drive serial number, when known
    pub serial: Option<String>,

    /// Whole disk (true) or partition/media slice (false)
    pub whole_disk: bool,
}

impl Device {
    /// Short human-readable name: the last component of the device path.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Device attributes as reported by the device subsystem, before normalization.
///
/// Byte fields are NUL-terminated, string fields are empty when unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescription {
    /// Kernel device file (`Block.Device`)
    pub device: Vec<u8>,

    /// Preferred device file (`Block.PreferredDevice`)
    pub preferred_device: Vec<u8>,

    /// Filesystem/partition UUID (`Block.IdUUID`)
    pub id_uuid: String,

    /// Serial of the backing drive (`Drive.Serial`)
    pub serial: String,

    /// Whether the block object is a partition of another block device
    pub partition: bool,
}

impl DeviceDescription {
    /// Device file path, preferring `PreferredDevice` over `Device`.
    pub fn device_file(&self) -> Option<String> {
        [&self.preferred_device, &self.device]
            .into_iter()
            .map(|bytes| decode_c_string_bytes(bytes))
            .find(|path| !path.trim().is_empty())
    }
}
