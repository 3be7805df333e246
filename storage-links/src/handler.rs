// SPDX-License-Identifier: GPL-3.0-only

use storage_types::DeviceEvent;

use crate::HandlerError;

/// Receiver of normalized device events.
///
/// Handlers are invoked sequentially on the dispatcher's task and must not block
/// for long: a slow handler delays every other handler and every later event.
pub trait EventHandler: Send {
    /// Name used when reporting failures.
    fn name(&self) -> &str;

    fn handle(&mut self, event: &DeviceEvent) -> Result<(), HandlerError>;
}
