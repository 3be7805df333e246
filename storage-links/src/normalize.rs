// SPDX-License-Identifier: GPL-3.0-only

//! Raw notification to canonical event conversion.

use std::path::PathBuf;

use storage_types::{Device, DeviceDescription, DeviceEvent, DeviceId, RawNotification};

/// Convert one raw notification into exactly one event.
pub fn normalize(raw: RawNotification) -> DeviceEvent {
    match raw {
        RawNotification::Added {
            object_path,
            description,
        } => DeviceEvent::Appeared(device_from(object_path, description)),
        RawNotification::Changed {
            object_path,
            description,
        } => DeviceEvent::Updated(device_from(object_path, description)),
        RawNotification::Removed { object_path } => {
            DeviceEvent::Disappeared(DeviceId::from(object_path))
        }
    }
}

fn device_from(object_path: String, description: DeviceDescription) -> Device {
    let path = description
        .device_file()
        .unwrap_or_else(|| fallback_device_file(&object_path));

    Device {
        path: PathBuf::from(path),
        uuid: non_empty(&description.id_uuid),
        serial: non_empty(&description.serial),
        whole_disk: !description.partition,
        id: DeviceId::from(object_path),
    }
}

/// UDisks2 names block objects after their kernel device.
fn fallback_device_file(object_path: &str) -> String {
    let name = object_path.rsplit('/').next().unwrap_or(object_path);
    format!("/dev/{name}")
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDA1: &str = "/org/freedesktop/UDisks2/block_devices/sda1";

    #[test]
    fn added_becomes_appeared_with_decoded_attributes() {
        let event = normalize(RawNotification::Added {
            object_path: SDA1.to_string(),
            description: DeviceDescription {
                device: b"/dev/sda1\0".to_vec(),
                preferred_device: b"/dev/sda1\0".to_vec(),
                id_uuid: " 1234-ABCD ".to_string(),
                serial: String::new(),
                partition: true,
            },
        });

        let DeviceEvent::Appeared(device) = event else {
            panic!("expected Appeared, got {event:?}");
        };
        assert_eq!(device.id.as_str(), SDA1);
        assert_eq!(device.path, PathBuf::from("/dev/sda1"));
        assert_eq!(device.uuid.as_deref(), Some("1234-ABCD"));
        assert_eq!(device.serial, None);
        assert!(!device.whole_disk);
    }

    #[test]
    fn changed_becomes_updated() {
        let event = normalize(RawNotification::Changed {
            object_path: SDA1.to_string(),
            description: DeviceDescription {
                device: b"/dev/sda1\0".to_vec(),
                ..Default::default()
            },
        });
        assert!(matches!(event, DeviceEvent::Updated(_)));
    }

    #[test]
    fn removed_becomes_disappeared() {
        let event = normalize(RawNotification::Removed {
            object_path: SDA1.to_string(),
        });
        assert_eq!(event, DeviceEvent::Disappeared(DeviceId::from(SDA1)));
    }

    #[test]
    fn missing_device_file_falls_back_to_object_name() {
        let event = normalize(RawNotification::Added {
            object_path: "/org/freedesktop/UDisks2/block_devices/nvme0n1".to_string(),
            description: DeviceDescription {
                serial: "S4EWNX0R123".to_string(),
                ..Default::default()
            },
        });
        let device = event.device().unwrap();
        assert_eq!(device.path, PathBuf::from("/dev/nvme0n1"));
        assert_eq!(device.serial.as_deref(), Some("S4EWNX0R123"));
        assert!(device.whole_disk);
    }
}
