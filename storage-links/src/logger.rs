// SPDX-License-Identifier: GPL-3.0-only

use std::io::Write;

use storage_types::{Device, DeviceEvent};

use crate::{EventHandler, HandlerError};

/// Prints one line per event to a sink.
pub struct InfoLogger<W> {
    sink: W,
    verbose: bool,
}

impl<W: Write + Send> InfoLogger<W> {
    pub fn new(sink: W, verbose: bool) -> Self {
        Self { sink, verbose }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

fn describe(device: &Device) -> String {
    format!(
        "path={}, uuid={}, serial={}, kind={}, id={}",
        device.path.display(),
        device.uuid.as_deref().unwrap_or("-"),
        device.serial.as_deref().unwrap_or("-"),
        if device.whole_disk { "disk" } else { "partition" },
        device.id
    )
}

pub(crate) fn format_event(event: &DeviceEvent, verbose: bool) -> String {
    let kind = event.kind().label();
    match event.device() {
        Some(device) if verbose => {
            format!("Disk {kind}: {} ({})", device.display_name(), describe(device))
        }
        Some(device) => format!("Disk {kind}: {}", device.display_name()),
        None => format!("Disk {kind}: {}", event.id()),
    }
}

impl<W: Write + Send> EventHandler for InfoLogger<W> {
    fn name(&self) -> &str {
        "info-logger"
    }

    fn handle(&mut self, event: &DeviceEvent) -> Result<(), HandlerError> {
        writeln!(self.sink, "{}", format_event(event, self.verbose))?;
        self.sink.flush()?;
        Ok(())
    }
}
