// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::Stream;
use futures::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use zbus::{Connection, MatchRule, MessageStream, fdo::ObjectManagerProxy, zvariant};
use zbus_macros::proxy;

use hwkit_contracts::{HwError, RegistryEvent};
use hwkit_types::HostInfo;

use crate::error::map_zbus_error;
use crate::platform;
use crate::records::{ManagedObjects, ROOT_UDI, storage_records};
use crate::registry::UdisksRegistry;
use crate::session::UdisksSession;

const UDISKS_SERVICE: &str = "org.freedesktop.UDisks2";

#[proxy(
    default_service = "org.freedesktop.UDisks2",
    default_path = "/org/freedesktop/UDisks2",
    interface = "org.freedesktop.DBus.ObjectManager"
)]
pub trait UDisks2ObjectManager {
    #[zbus(signal)]
    fn interfaces_added(
        &self,
        object_path: zvariant::OwnedObjectPath,
        interfaces_and_properties: HashMap<String, HashMap<String, zvariant::OwnedValue>>,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    fn interfaces_removed(
        &self,
        object_path: zvariant::OwnedObjectPath,
        interfaces: Vec<String>,
    ) -> zbus::Result<()>;
}

/// Owns the system bus connection and keeps the registry and session in
/// step with the UDisks2 object tree.
#[derive(Clone)]
pub struct UdisksManager {
    connection: Connection,
    registry: Arc<UdisksRegistry>,
    session: Arc<UdisksSession>,
}

/// Registry topology changes observed on the bus.
pub struct RegistryEventStream {
    receiver: mpsc::Receiver<RegistryEvent>,
}

impl UdisksManager {
    /// Connect to the system bus and take the first snapshot.
    pub async fn connect() -> Result<Self, HwError> {
        let connection = Connection::system()
            .await
            .map_err(|e| map_zbus_error("connect to the system bus", e))?;

        let manager = Self {
            session: Arc::new(UdisksSession::new(connection.clone())),
            registry: Arc::default(),
            connection,
        };
        manager.refresh().await?;
        Ok(manager)
    }

    pub fn registry(&self) -> Arc<UdisksRegistry> {
        self.registry.clone()
    }

    pub fn session(&self) -> Arc<UdisksSession> {
        self.session.clone()
    }

    async fn managed_objects(&self) -> Result<ManagedObjects, HwError> {
        let what = "list UDisks2 objects";
        let proxy = ObjectManagerProxy::builder(&self.connection)
            .destination(UDISKS_SERVICE)
            .map_err(|e| map_zbus_error(what, e))?
            .path(ROOT_UDI)
            .map_err(|e| map_zbus_error(what, e))?
            .build()
            .await
            .map_err(|e| map_zbus_error(what, e))?;

        let managed = proxy
            .get_managed_objects()
            .await
            .map_err(|e| HwError::transport(format!("{what}: {e}")))?;

        Ok(managed
            .into_iter()
            .map(|(path, interfaces)| {
                let interfaces = interfaces
                    .into_iter()
                    .map(|(name, props)| (name.to_string(), props))
                    .collect();
                (path.to_string(), interfaces)
            })
            .collect())
    }

    /// Re-read the object tree, returning the topology changes.
    pub async fn refresh(&self) -> Result<Vec<RegistryEvent>, HwError> {
        let managed = self.managed_objects().await?;
        let host: HostInfo = platform::host_info();

        let mut records = vec![platform::root_record()];
        records.extend(platform::cpu_records());
        records.extend(platform::battery_records());
        records.extend(storage_records(&managed));
        debug!("UDisks2 snapshot: {} objects, {} records", managed.len(), records.len());

        let (added, removed) = self.registry.replace(records);
        self.session.update(managed, host);

        Ok(removed
            .into_iter()
            .map(RegistryEvent::Removed)
            .chain(added.into_iter().map(RegistryEvent::Added))
            .collect())
    }

    /// Follow the bus and re-snapshot on every object or property change.
    ///
    /// Mount path changes reach [`UdisksSession`] subscribers as a side
    /// effect of the refresh.
    pub async fn watch(&self) -> Result<RegistryEventStream, HwError> {
        let what = "watch UDisks2";
        let (sender, receiver) = mpsc::channel(32);

        let object_manager = UDisks2ObjectManagerProxy::new(&self.connection)
            .await
            .map_err(|e| map_zbus_error(what, e))?;
        let mut added_stream = object_manager
            .receive_interfaces_added()
            .await
            .map_err(|e| map_zbus_error(what, e))?;
        let mut removed_stream = object_manager
            .receive_interfaces_removed()
            .await
            .map_err(|e| map_zbus_error(what, e))?;

        let rule = MatchRule::builder()
            .msg_type(zbus::message::Type::Signal)
            .sender(UDISKS_SERVICE)
            .and_then(|b| b.interface("org.freedesktop.DBus.Properties"))
            .and_then(|b| b.member("PropertiesChanged"))
            .map_err(|e| map_zbus_error(what, e))?
            .build();
        let mut changed_stream = Box::pin(
            MessageStream::for_match_rule(rule, &self.connection, None)
                .await
                .map_err(|e| map_zbus_error(what, e))?,
        );

        let manager = self.clone();
        tokio::spawn(async move {
            loop {
                let trigger = tokio::select! {
                    added = added_stream.next() => added.map(|_| "InterfacesAdded"),
                    removed = removed_stream.next() => removed.map(|_| "InterfacesRemoved"),
                    changed = changed_stream.next() => changed.map(|_| "PropertiesChanged"),
                };
                let Some(trigger) = trigger else {
                    info!("UDisks2 signal stream closed");
                    break;
                };

                let events = match manager.refresh().await {
                    Ok(events) => events,
                    Err(e) => {
                        warn!("Refresh after {trigger} failed: {e}");
                        continue;
                    }
                };
                for event in events {
                    if let Err(e) = sender.send(event).await {
                        warn!("Registry event receiver dropped: {e}");
                        return;
                    }
                }
            }
        });

        Ok(RegistryEventStream { receiver })
    }
}

impl Stream for RegistryEventStream {
    type Item = RegistryEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
