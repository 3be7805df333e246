// SPDX-License-Identifier: GPL-3.0-only

//! Atomic symlink placement inside a managed directory.

use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{HandlerError, LinkOp};

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Fixed-length name so any key that fits `NAME_MAX` can be staged.
fn staging_path(dir: &Path) -> PathBuf {
    let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(".staging-{}-{seq}", std::process::id()))
}

/// Point `dir/name` at `target`, replacing whatever link is there.
///
/// The link is created under a staging name and renamed into place, so readers
/// see either the old link or the new one.
pub(crate) fn place_link(dir: &Path, name: &str, target: &Path) -> Result<(), HandlerError> {
    let staging = staging_path(dir);
    symlink(target, &staging).map_err(|e| HandlerError::link(LinkOp::Create, &staging, e))?;

    let destination = dir.join(name);
    if let Err(e) = fs::rename(&staging, &destination) {
        let _ = fs::remove_file(&staging);
        return Err(HandlerError::link(LinkOp::Rename, destination, e));
    }
    Ok(())
}

/// Atomically move link `from` to `to`, replacing `to` if present.
pub(crate) fn rename_link(dir: &Path, from: &str, to: &str) -> io::Result<()> {
    fs::rename(dir.join(from), dir.join(to))
}

/// Remove `dir/name` if it is a symlink. Missing links are not an error.
pub(crate) fn remove_link(dir: &Path, name: &str) -> Result<(), HandlerError> {
    let path = dir.join(name);
    match fs::symlink_metadata(&path) {
        Ok(metadata) if metadata.file_type().is_symlink() => {}
        Ok(_) => {
            tracing::warn!("Not removing {}: not a symlink", path.display());
            return Ok(());
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(HandlerError::link(LinkOp::Remove, path, e)),
    }

    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(HandlerError::link(LinkOp::Remove, path, e)),
    }
}

/// Remove every symlink in `dir`, including staging leftovers.
///
/// Regular files and directories are left alone. Returns the number removed.
pub(crate) fn prune_links(dir: &Path) -> Result<usize, HandlerError> {
    let entries = fs::read_dir(dir).map_err(|e| HandlerError::link(LinkOp::Scan, dir, e))?;

    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| HandlerError::link(LinkOp::Scan, dir, e))?;
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_symlink() {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(HandlerError::link(LinkOp::Remove, entry.path(), e)),
        }
    }
    Ok(removed)
}
