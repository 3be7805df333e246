// SPDX-License-Identifier: GPL-3.0-only

//! Key derivation per naming scheme.

use std::path::Path;

use storage_types::{Device, LinkScheme};

/// Link name for `device` under `scheme`, or `None` when the device has no key.
pub fn derive_key(scheme: LinkScheme, device: &Device) -> Option<String> {
    match scheme {
        LinkScheme::ByPath => path_key(&device.path),
        LinkScheme::ByUuid => device.uuid.as_deref().and_then(sanitize),
        // Partitions report the serial of the drive they live on.
        LinkScheme::BySerial if device.whole_disk => device.serial.as_deref().and_then(sanitize),
        LinkScheme::BySerial => None,
    }
}

fn path_key(path: &Path) -> Option<String> {
    let path = path.to_string_lossy();
    let relative = match path.strip_prefix("/dev/") {
        Some(rest) => rest,
        None => path.trim_start_matches('/'),
    };
    sanitize(relative)
}

/// Make `raw` usable as a single file name.
///
/// Dot-prefixed names are rejected: they are reserved for staging links.
pub(crate) fn sanitize(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c == '/' || c.is_control() || c.is_whitespace() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.starts_with('.') {
        None
    } else {
        Some(cleaned)
    }
}
