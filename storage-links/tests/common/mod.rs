// SPDX-License-Identifier: GPL-3.0-only

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use storage_contracts::{DeviceEventSource, DeviceEventStream, SourceError};
use storage_links::{Linker, LinkerOptions};
use storage_types::{Device, DeviceId, LinkScheme, RawNotification};

/// Source that replays a fixed list of notifications and then closes.
pub struct ReplaySource {
    script: Vec<RawNotification>,
}

impl ReplaySource {
    pub fn new(script: Vec<RawNotification>) -> Self {
        Self { script }
    }
}

#[async_trait]
impl DeviceEventSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn subscribe(&mut self) -> Result<DeviceEventStream, SourceError> {
        let (sender, stream) = DeviceEventStream::channel(self.script.len().max(1));
        for notification in self.script.drain(..) {
            sender
                .try_send(notification)
                .map_err(|_| SourceError::Closed)?;
        }
        Ok(stream)
    }

    async fn unsubscribe(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}

pub fn device(name: &str, uuid: Option<&str>, serial: Option<&str>, whole_disk: bool) -> Device {
    Device {
        id: DeviceId::new(format!("/org/freedesktop/UDisks2/block_devices/{name}")),
        path: PathBuf::from(format!("/dev/{name}")),
        uuid: uuid.map(str::to_string),
        serial: serial.map(str::to_string),
        whole_disk,
    }
}

pub fn linkers(base: &Path) -> Vec<Linker> {
    LinkScheme::ALL
        .iter()
        .map(|scheme| {
            Linker::new(*scheme, base.join(scheme.dir_name()), LinkerOptions::default()).unwrap()
        })
        .collect()
}

/// Symlinks in `dir` as (name, target), sorted.
pub fn on_disk(dir: &Path) -> Vec<(String, PathBuf)> {
    let mut links: Vec<(String, PathBuf)> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            (
                entry.file_name().to_string_lossy().to_string(),
                fs::read_link(entry.path()).unwrap(),
            )
        })
        .collect();
    links.sort();
    links
}

pub fn link(name: &str, target: &str) -> (String, PathBuf) {
    (name.to_string(), PathBuf::from(target))
}
