// SPDX-License-Identifier: GPL-3.0-only

//! Device notifications, raw and normalized

use serde::{Deserialize, Serialize};

use crate::{Device, DeviceDescription, DeviceId};

/// A notification exactly as the device subsystem delivered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawNotification {
    /// A block object was added
    Added {
        object_path: String,
        description: DeviceDescription,
    },

    /// A block object was removed
    Removed { object_path: String },

    /// Properties of a block object changed
    Changed {
        object_path: String,
        description: DeviceDescription,
    },
}

impl RawNotification {
    pub fn object_path(&self) -> &str {
        match self {
            Self::Added { object_path, .. }
            | Self::Removed { object_path }
            | Self::Changed { object_path, .. } => object_path,
        }
    }
}

/// Canonical event delivered to every handler.
///
/// For one identity the order is `Appeared`, zero or more `Updated`, then `Disappeared`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceEvent {
    Appeared(Device),
    Disappeared(DeviceId),
    Updated(Device),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceEventKind {
    Appeared,
    Disappeared,
    Updated,
}

impl DeviceEventKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Appeared => "Appeared",
            Self::Disappeared => "Disappeared",
            Self::Updated => "Updated",
        }
    }
}

impl DeviceEvent {
    pub fn id(&self) -> &DeviceId {
        match self {
            Self::Appeared(device) | Self::Updated(device) => &device.id,
            Self::Disappeared(id) => id,
        }
    }

    pub fn kind(&self) -> DeviceEventKind {
        match self {
            Self::Appeared(_) => DeviceEventKind::Appeared,
            Self::Disappeared(_) => DeviceEventKind::Disappeared,
            Self::Updated(_) => DeviceEventKind::Updated,
        }
    }

    /// The device carried by the event; `None` for `Disappeared`.
    pub fn device(&self) -> Option<&Device> {
        match self {
            Self::Appeared(device) | Self::Updated(device) => Some(device),
            Self::Disappeared(_) => None,
        }
    }
}
