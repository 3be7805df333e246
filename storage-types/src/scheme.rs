// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use serde::{Deserialize, Serialize};

/// Naming scheme of one managed link directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkScheme {
    /// Keyed by device node path
    ByPath,

    /// Keyed by filesystem/partition UUID
    ByUuid,

    /// Keyed by drive serial number (whole disks only)
    BySerial,
}

impl LinkScheme {
    pub const ALL: [LinkScheme; 3] = [Self::ByPath, Self::ByUuid, Self::BySerial];

    /// Directory name below the base path
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::ByPath => "by-path",
            Self::ByUuid => "by-uuid",
            Self::BySerial => "by-serial",
        }
    }
}

impl fmt::Display for LinkScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
