// SPDX-License-Identifier: GPL-3.0-only

//! One managed directory of symlinks per naming scheme.

mod fsops;
mod scheme;
mod table;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use storage_types::{Device, DeviceEvent, DeviceId, LinkScheme};
use tracing::{debug, info};

use crate::{EventHandler, HandlerError, LinkOp};

pub use scheme::derive_key;
pub use table::{LinkEntry, LinkTable};

#[derive(Debug, Clone, Copy)]
pub struct LinkerOptions {
    /// Remove links left behind by a previous run when the linker is created.
    pub prune_stale: bool,
}

impl Default for LinkerOptions {
    fn default() -> Self {
        Self { prune_stale: true }
    }
}

/// Keeps `dir` holding exactly one link per live device with a key under `scheme`.
pub struct Linker {
    scheme: LinkScheme,
    dir: PathBuf,
    table: LinkTable,
}

impl Linker {
    /// Create the managed directory if needed and take ownership of it.
    pub fn new(
        scheme: LinkScheme,
        dir: impl Into<PathBuf>,
        options: LinkerOptions,
    ) -> Result<Self, HandlerError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| HandlerError::link(LinkOp::CreateDir, &dir, e))?;

        if options.prune_stale {
            let removed = fsops::prune_links(&dir)?;
            if removed > 0 {
                info!("Removed {} stale links from {}", removed, dir.display());
            }
        }

        Ok(Self {
            scheme,
            dir,
            table: LinkTable::new(),
        })
    }

    pub fn scheme(&self) -> LinkScheme {
        self.scheme
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn table(&self) -> &LinkTable {
        &self.table
    }

    /// Links this linker maintains, sorted by name.
    pub fn links(&self) -> Vec<(String, PathBuf)> {
        self.table.materialized()
    }

    /// Bring the link for `device` in line with its current attributes.
    ///
    /// Handles both arrival and update; an update for an unknown device is an arrival.
    fn link_device(&mut self, device: &Device) -> Result<(), HandlerError> {
        let key = derive_key(self.scheme, device);
        let previous = self.table.get(&device.id).cloned();

        match (previous, key) {
            (None, None) => Ok(()),
            (None, Some(name)) => self.claim(&device.id, name, &device.path),
            (Some(_), None) => {
                debug!("{}: {} no longer has a key", self.scheme, device.id);
                self.release(&device.id)
            }
            (Some(previous), Some(name))
                if previous.name == name && previous.target == device.path =>
            {
                Ok(())
            }
            (Some(previous), Some(name)) => self.relink(&device.id, previous, name, &device.path),
        }
    }

    fn claim(&mut self, id: &DeviceId, name: String, target: &Path) -> Result<(), HandlerError> {
        fsops::place_link(&self.dir, &name, target)?;
        debug!("{}: {} -> {}", self.scheme, name, target.display());
        self.table.insert(
            id.clone(),
            LinkEntry {
                name,
                target: target.to_path_buf(),
            },
        );
        Ok(())
    }

    /// Move the link of `id` from `previous` to `name` -> `target`.
    fn relink(
        &mut self,
        id: &DeviceId,
        previous: LinkEntry,
        name: String,
        target: &Path,
    ) -> Result<(), HandlerError> {
        let owned_previous = self.table.is_owner(id, &previous.name);
        let has_successor = self.table.successor(&previous.name).is_some();

        if owned_previous && !has_successor && previous.target == target && previous.name != name {
            match fsops::rename_link(&self.dir, &previous.name, &name) {
                Ok(()) => {
                    debug!("{}: {} renamed to {}", self.scheme, previous.name, name);
                    self.table.insert(
                        id.clone(),
                        LinkEntry {
                            name,
                            target: target.to_path_buf(),
                        },
                    );
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("{}: {} vanished, recreating", self.scheme, previous.name);
                }
                Err(e) => {
                    return Err(HandlerError::link(
                        LinkOp::Rename,
                        self.dir.join(&previous.name),
                        e,
                    ));
                }
            }
        }

        // New link first so the device never goes without one.
        let same_name = previous.name == name;
        self.claim(id, name, target)?;
        if same_name {
            return Ok(());
        }
        if owned_previous {
            self.restore_or_remove(&previous.name)?;
        }
        Ok(())
    }

    fn release(&mut self, id: &DeviceId) -> Result<(), HandlerError> {
        let Some(entry) = self.table.get(id).cloned() else {
            return Ok(());
        };
        let owned = self.table.is_owner(id, &entry.name);
        self.table.remove(id);

        if owned {
            self.restore_or_remove(&entry.name)?;
        }
        Ok(())
    }

    /// Hand `name` to its current owner in the table, or remove it when unclaimed.
    fn restore_or_remove(&mut self, name: &str) -> Result<(), HandlerError> {
        let owner_target = self
            .table
            .owner(name)
            .and_then(|owner| self.table.get(owner))
            .map(|entry| entry.target.clone());

        match owner_target {
            Some(target) => {
                debug!("{}: {} handed back to {}", self.scheme, name, target.display());
                fsops::place_link(&self.dir, name, &target)
            }
            None => {
                debug!("{}: removing {}", self.scheme, name);
                fsops::remove_link(&self.dir, name)
            }
        }
    }
}

impl EventHandler for Linker {
    fn name(&self) -> &str {
        self.scheme.dir_name()
    }

    fn handle(&mut self, event: &DeviceEvent) -> Result<(), HandlerError> {
        match event {
            DeviceEvent::Appeared(device) | DeviceEvent::Updated(device) => {
                self.link_device(device)
            }
            DeviceEvent::Disappeared(id) => self.release(id),
        }
    }
}
