// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;

use zbus::zvariant::{self, Value};
use zbus_macros::proxy;

pub(crate) const UDISKS2_SERVICE: &str = "org.freedesktop.UDisks2";
pub(crate) const UDISKS2_ROOT: &str = "/org/freedesktop/UDisks2";
pub(crate) const BLOCK_IFACE: &str = "org.freedesktop.UDisks2.Block";
pub(crate) const OBJECT_MANAGER_IFACE: &str = "org.freedesktop.DBus.ObjectManager";
pub(crate) const PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";
pub(crate) const BLOCK_DEVICES_NAMESPACE: &str = "/org/freedesktop/UDisks2/block_devices";

#[proxy(
    default_service = "org.freedesktop.UDisks2",
    default_path = "/org/freedesktop/UDisks2/Manager",
    interface = "org.freedesktop.UDisks2.Manager"
)]
pub trait UDisks2Manager {
    fn get_block_devices(
        &self,
        options: HashMap<String, Value<'_>>,
    ) -> zbus::Result<Vec<zvariant::OwnedObjectPath>>;
}

/// Block properties that feed a device description.
const DESCRIBED_PROPERTIES: [&str; 4] = ["Device", "PreferredDevice", "IdUUID", "Drive"];

/// Whether a `PropertiesChanged` payload touches anything we describe.
pub(crate) fn touches_description(changed: &[String], invalidated: &[String]) -> bool {
    DESCRIBED_PROPERTIES
        .iter()
        .any(|name| changed.iter().chain(invalidated).any(|property| property == name))
}

pub(crate) fn is_block_object(object_path: &str) -> bool {
    object_path
        .strip_prefix(BLOCK_DEVICES_NAMESPACE)
        .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
}
