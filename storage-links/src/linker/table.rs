// SPDX-License-Identifier: GPL-3.0-only

//! Per-linker record of the links materialized for each device.

use std::collections::HashMap;
use std::path::PathBuf;

use storage_types::DeviceId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// File name inside the managed directory
    pub name: String,

    /// Path the link points at
    pub target: PathBuf,
}

/// Device identity to link mapping.
///
/// Several live devices may derive the same link name (cloned partitions sharing
/// a UUID, for instance). Every claimant is remembered in claim order and the
/// most recent one owns the link on disk.
#[derive(Debug, Default)]
pub struct LinkTable {
    entries: HashMap<DeviceId, LinkEntry>,
    claims: HashMap<String, Vec<DeviceId>>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &DeviceId) -> Option<&LinkEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record `entry` for `id`, making `id` the owner of `entry.name`.
    pub fn insert(&mut self, id: DeviceId, entry: LinkEntry) -> Option<LinkEntry> {
        let previous = self.remove(&id);
        self.claims
            .entry(entry.name.clone())
            .or_default()
            .push(id.clone());
        self.entries.insert(id, entry);
        previous
    }

    pub fn remove(&mut self, id: &DeviceId) -> Option<LinkEntry> {
        let entry = self.entries.remove(id)?;
        if let Some(claimants) = self.claims.get_mut(&entry.name) {
            claimants.retain(|claimant| claimant != id);
            if claimants.is_empty() {
                self.claims.remove(&entry.name);
            }
        }
        Some(entry)
    }

    /// The device whose link currently occupies `name`.
    pub fn owner(&self, name: &str) -> Option<&DeviceId> {
        self.claims.get(name).and_then(|claimants| claimants.last())
    }

    pub fn is_owner(&self, id: &DeviceId, name: &str) -> bool {
        self.owner(name) == Some(id)
    }

    /// The claimant that takes over `name` once its current owner lets go.
    pub fn successor(&self, name: &str) -> Option<(&DeviceId, &LinkEntry)> {
        let claimants = self.claims.get(name)?;
        let [.., next, _owner] = claimants.as_slice() else {
            return None;
        };
        self.entries.get(next).map(|entry| (next, entry))
    }

    /// Links as they should exist on disk, sorted by name.
    pub fn materialized(&self) -> Vec<(String, PathBuf)> {
        let mut links: Vec<(String, PathBuf)> = self
            .claims
            .iter()
            .filter_map(|(name, claimants)| {
                let owner = claimants.last()?;
                let entry = self.entries.get(owner)?;
                Some((name.clone(), entry.target.clone()))
            })
            .collect();
        links.sort();
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, target: &str) -> LinkEntry {
        LinkEntry {
            name: name.to_string(),
            target: PathBuf::from(target),
        }
    }

    #[test]
    fn insert_and_remove_track_ownership() {
        let mut table = LinkTable::new();
        let sda = DeviceId::from("sda");

        assert!(table.insert(sda.clone(), entry("SN001", "/dev/sda")).is_none());
        assert!(table.is_owner(&sda, "SN001"));
        assert_eq!(table.len(), 1);

        let removed = table.remove(&sda).unwrap();
        assert_eq!(removed.name, "SN001");
        assert!(table.owner("SN001").is_none());
        assert!(table.is_empty());
        assert!(table.remove(&sda).is_none());
    }

    #[test]
    fn reinsert_moves_claim_to_new_name() {
        let mut table = LinkTable::new();
        let sdb1 = DeviceId::from("sdb1");

        table.insert(sdb1.clone(), entry("old", "/dev/sdb1"));
        let previous = table.insert(sdb1.clone(), entry("new", "/dev/sdb1"));

        assert_eq!(previous, Some(entry("old", "/dev/sdb1")));
        assert!(table.owner("old").is_none());
        assert!(table.is_owner(&sdb1, "new"));
        assert_eq!(table.materialized(), vec![("new".to_string(), PathBuf::from("/dev/sdb1"))]);
    }

    #[test]
    fn latest_claimant_owns_and_predecessor_succeeds() {
        let mut table = LinkTable::new();
        let first = DeviceId::from("sdc1");
        let second = DeviceId::from("sdd1");

        table.insert(first.clone(), entry("1234-ABCD", "/dev/sdc1"));
        table.insert(second.clone(), entry("1234-ABCD", "/dev/sdd1"));

        assert!(table.is_owner(&second, "1234-ABCD"));
        let (next, next_entry) = table.successor("1234-ABCD").unwrap();
        assert_eq!(next, &first);
        assert_eq!(next_entry.target, PathBuf::from("/dev/sdc1"));
        assert_eq!(
            table.materialized(),
            vec![("1234-ABCD".to_string(), PathBuf::from("/dev/sdd1"))]
        );

        table.remove(&second);
        assert!(table.is_owner(&first, "1234-ABCD"));
        assert!(table.successor("1234-ABCD").is_none());
    }
}
