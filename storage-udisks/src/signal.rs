// SPDX-License-Identifier: GPL-3.0-only

//! UDisks2 signals that matter for block devices.
//!
//! All of them are read from a single match-rule stream so they reach the
//! forwarder in the order the bus delivered them.

use std::collections::HashMap;

use zbus::message::Type as MessageType;
use zbus::names::BusName;
use zbus::zvariant::{OwnedObjectPath, OwnedValue};
use zbus::{Connection, MatchRule, Message, MessageStream};

use crate::error::DiskError;
use crate::manager::{OBJECT_MANAGER_IFACE, PROPERTIES_IFACE, UDISKS2_ROOT, UDISKS2_SERVICE};

/// Signals buffered while the forwarder is busy describing a device.
const SIGNAL_QUEUE: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusSignal {
    InterfacesAdded {
        object_path: String,
        interfaces: Vec<String>,
    },
    InterfacesRemoved {
        object_path: String,
        interfaces: Vec<String>,
    },
    PropertiesChanged {
        object_path: String,
        interface: String,
        changed: Vec<String>,
        invalidated: Vec<String>,
    },
}

impl BusSignal {
    /// Parse `message`, or `None` for signals we do not follow.
    pub fn from_message(message: &Message) -> Result<Option<Self>, zbus::Error> {
        let header = message.header();
        let (Some(interface), Some(member), Some(emitter)) =
            (header.interface(), header.member(), header.path())
        else {
            return Ok(None);
        };

        let body = message.body();
        let signal = match (interface.as_str(), member.as_str()) {
            (OBJECT_MANAGER_IFACE, "InterfacesAdded") => {
                let (object_path, interfaces): (
                    OwnedObjectPath,
                    HashMap<String, HashMap<String, OwnedValue>>,
                ) = body.deserialize()?;
                Self::InterfacesAdded {
                    object_path: object_path.to_string(),
                    interfaces: interfaces.into_keys().collect(),
                }
            }
            (OBJECT_MANAGER_IFACE, "InterfacesRemoved") => {
                let (object_path, interfaces): (OwnedObjectPath, Vec<String>) =
                    body.deserialize()?;
                Self::InterfacesRemoved {
                    object_path: object_path.to_string(),
                    interfaces,
                }
            }
            (PROPERTIES_IFACE, "PropertiesChanged") => {
                let (interface, changed, invalidated): (
                    String,
                    HashMap<String, OwnedValue>,
                    Vec<String>,
                ) = body.deserialize()?;
                Self::PropertiesChanged {
                    object_path: emitter.to_string(),
                    interface,
                    changed: changed.into_keys().collect(),
                    invalidated,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(signal))
    }
}

/// Every signal UDisks2 emits under its root, in delivery order.
///
/// The rule is bound to the current owner of the UDisks2 name so that other
/// peers cannot inject device removals.
pub async fn udisks_signal_stream(connection: &Connection) -> Result<MessageStream, DiskError> {
    let dbus = zbus::fdo::DBusProxy::new(connection).await?;
    let service = BusName::try_from(UDISKS2_SERVICE).map_err(zbus::Error::from)?;
    let owner = dbus
        .get_name_owner(service)
        .await
        .map_err(|e| DiskError::ConnectionFailed(format!("{UDISKS2_SERVICE} has no owner: {e}")))?;

    let rule = MatchRule::builder()
        .msg_type(MessageType::Signal)
        .sender(owner.as_str())?
        .path_namespace(UDISKS2_ROOT)?
        .build();

    Ok(MessageStream::for_match_rule(rule, connection, Some(SIGNAL_QUEUE)).await?)
}
