// SPDX-License-Identifier: GPL-3.0-only

//! Build a [`DeviceDescription`] for one UDisks2 block object.

use storage_types::DeviceDescription;
use udisks2::{block::BlockProxy, drive::DriveProxy, partition::PartitionProxy};
use zbus::Connection;
use zbus::zvariant::OwnedObjectPath;

use crate::error::DiskError;
use crate::manager::is_block_object;

pub async fn describe_block(
    connection: &Connection,
    object_path: &str,
) -> Result<DeviceDescription, DiskError> {
    if !is_block_object(object_path) {
        return Err(DiskError::InvalidPath(object_path.to_string()));
    }

    let block = BlockProxy::builder(connection)
        .path(object_path)?
        .build()
        .await?;

    let device = block.device().await.map_err(|e| DiskError::Query {
        object_path: object_path.to_string(),
        reason: e.to_string(),
    })?;
    let preferred_device = block.preferred_device().await.unwrap_or_default();
    let id_uuid = block.id_uuid().await.unwrap_or_default();

    let serial = match block.drive().await {
        Ok(drive_path) => drive_serial(connection, &drive_path).await,
        Err(e) => {
            tracing::debug!("No drive for {}: {}", object_path, e);
            String::new()
        }
    };

    Ok(DeviceDescription {
        device,
        preferred_device,
        id_uuid,
        serial,
        partition: is_partition(connection, object_path).await,
    })
}

async fn is_partition(connection: &Connection, object_path: &str) -> bool {
    let Ok(builder) = PartitionProxy::builder(connection).path(object_path) else {
        return false;
    };
    match builder.build().await {
        // The proxy builds for any object; only real partitions expose a table.
        Ok(partition) => partition.table().await.is_ok(),
        Err(_) => false,
    }
}

async fn drive_serial(connection: &Connection, drive_path: &OwnedObjectPath) -> String {
    if drive_path.as_str() == "/" {
        return String::new();
    }

    let drive = match DriveProxy::builder(connection).path(drive_path) {
        Ok(builder) => builder.build().await,
        Err(e) => Err(e),
    };

    match drive {
        Ok(drive) => drive.serial().await.unwrap_or_default(),
        Err(e) => {
            tracing::debug!("Could not open drive {}: {}", drive_path, e);
            String::new()
        }
    }
}
