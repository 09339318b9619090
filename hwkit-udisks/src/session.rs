// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use udisks2::drive::DriveProxy;
use udisks2::filesystem::FilesystemProxy;
use zbus::Connection;

use hwkit_contracts::{DiskHandle, HwError, NativeSession, PropertyChange};
use hwkit_types::keys::description as da;
use hwkit_types::{HostInfo, PropertyMap};

use crate::bytestring::{decode_mount_points, kernel_name, owned_value_to_bytestring};
use crate::error::{map_udisks_error, map_zbus_error};
use crate::records::{
    BLOCK_IFACE, DRIVE_IFACE, FILESYSTEM_IFACE, ManagedObjects, PARTITION_IFACE, Properties,
    as_bool, as_object_path, as_string,
};

const PUSH_CAPACITY: usize = 64;

fn mount_points(filesystem: &Properties) -> Vec<String> {
    filesystem
        .get("MountPoints")
        .and_then(|v| Vec::<Vec<u8>>::try_from(v.clone()).ok())
        .map(decode_mount_points)
        .unwrap_or_default()
}

fn text(props: &Properties, name: &str) -> Option<String> {
    props.get(name).and_then(as_string).filter(|s| !s.is_empty())
}

/// Kernel name of a block object (`sr0`, `nvme0n1p2`).
fn block_name_of(block: &Properties) -> Option<String> {
    let device = block
        .get("PreferredDevice")
        .and_then(owned_value_to_bytestring)
        .filter(|d| !d.is_empty())
        .or_else(|| block.get("Device").and_then(owned_value_to_bytestring))?;
    Some(kernel_name(&device).to_string())
}

/// Object path of the block device named `block_name`.
pub fn find_block(managed: &ManagedObjects, block_name: &str) -> Option<String> {
    managed.iter().find_map(|(path, interfaces)| {
        let block = interfaces.get(BLOCK_IFACE)?;
        (block_name_of(block)? == block_name).then(|| path.clone())
    })
}

fn connection_protocol(bus: &str, block_name: &str) -> Option<&'static str> {
    match bus {
        "usb" => Some("USB"),
        "ieee1394" => Some("FireWire"),
        "sdio" => Some("Secure Digital"),
        _ if block_name.starts_with("nvme") => Some("PCI-Express"),
        _ if block_name.starts_with("sd") || block_name.starts_with("sr") => Some("SATA"),
        _ => None,
    }
}

/// Disk description of the block object at `path`.
pub fn describe_block(managed: &ManagedObjects, path: &str) -> Result<PropertyMap, HwError> {
    let interfaces = managed
        .get(path)
        .ok_or_else(|| HwError::transport(format!("{path} is no longer present")))?;
    let block = interfaces
        .get(BLOCK_IFACE)
        .ok_or_else(|| HwError::transport(format!("{path} is not a block device")))?;

    let mut description = PropertyMap::new();
    if let Some(mount_path) = interfaces
        .get(FILESYSTEM_IFACE)
        .and_then(|fs| mount_points(fs).into_iter().next())
    {
        description.insert(da::VOLUME_PATH, mount_path);
    }
    if let Some(kind) = text(block, "IdType") {
        description.insert(da::VOLUME_KIND, kind);
    }
    if let Some(label) = text(block, "IdLabel") {
        description.insert(da::VOLUME_NAME, label);
    }

    let drive = block
        .get("Drive")
        .and_then(as_object_path)
        .and_then(|p| managed.get(&p))
        .and_then(|i| i.get(DRIVE_IFACE));
    if let Some(drive) = drive {
        if let Some(vendor) = text(drive, "Vendor") {
            description.insert(da::DEVICE_VENDOR, vendor);
        }
        if let Some(model) = text(drive, "Model") {
            description.insert(da::DEVICE_MODEL, model);
        }
        let bus = text(drive, "ConnectionBus").unwrap_or_default();
        let name = block_name_of(block).unwrap_or_default();
        if let Some(protocol) = connection_protocol(&bus, &name) {
            description.insert(da::DEVICE_PROTOCOL, protocol);
        }
        let removable = drive.get("Removable").and_then(as_bool).unwrap_or(false);
        description.insert(da::DEVICE_INTERNAL, !removable);
    }

    Ok(description)
}

/// Filesystems that are mounted on the block at `path` or its partitions.
fn mounted_filesystems(managed: &ManagedObjects, path: &str, whole: bool) -> Vec<String> {
    managed
        .iter()
        .filter(|(candidate, interfaces)| {
            *candidate == path
                || (whole
                    && interfaces
                        .get(PARTITION_IFACE)
                        .and_then(|p| p.get("Table"))
                        .and_then(as_object_path)
                        .is_some_and(|table| table == path))
        })
        .filter(|(_, interfaces)| {
            interfaces
                .get(FILESYSTEM_IFACE)
                .is_some_and(|fs| !mount_points(fs).is_empty())
        })
        .map(|(candidate, _)| candidate.clone())
        .collect()
}

fn volume_path(managed: &ManagedObjects, udi: &str) -> Option<String> {
    managed
        .get(udi)
        .and_then(|i| i.get(FILESYSTEM_IFACE))
        .and_then(|fs| mount_points(fs).into_iter().next())
}

/// Mount path changes between two snapshots for the given UDIs.
pub fn volume_path_changes<'a>(
    old: &ManagedObjects,
    new: &ManagedObjects,
    udis: impl IntoIterator<Item = &'a str>,
) -> Vec<PropertyChange> {
    udis.into_iter()
        .filter_map(|udi| {
            let after = volume_path(new, udi);
            (volume_path(old, udi) != after).then(|| PropertyChange {
                udi: udi.to_string(),
                key: da::VOLUME_PATH.to_string(),
                value: after.map(Into::into),
            })
        })
        .collect()
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Volume management through UDisks2.
///
/// Descriptions are answered from the object snapshot of the last refresh;
/// mount, unmount and eject go to the daemon.
pub struct UdisksSession {
    connection: Connection,
    managed: Arc<RwLock<ManagedObjects>>,
    host: RwLock<HostInfo>,
    push: Mutex<HashMap<String, broadcast::Sender<PropertyChange>>>,
}

impl UdisksSession {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            managed: Arc::default(),
            host: RwLock::default(),
            push: Mutex::default(),
        }
    }

    /// Install a new snapshot and push mount path changes to subscribers.
    pub fn update(&self, managed: ManagedObjects, host: HostInfo) {
        *self.host.write().unwrap_or_else(PoisonError::into_inner) = host;

        let mut push = self.push.lock().unwrap_or_else(PoisonError::into_inner);
        push.retain(|_, sender| sender.receiver_count() > 0);

        let mut current = self.managed.write().unwrap_or_else(PoisonError::into_inner);
        let changes = volume_path_changes(&current, &managed, push.keys().map(String::as_str));
        *current = managed;
        drop(current);

        for change in changes {
            debug!("Pushing {} = {:?} for {}", change.key, change.value, change.udi);
            if let Some(sender) = push.get(&change.udi) {
                let _ = sender.send(change);
            }
        }
    }
}

impl NativeSession for UdisksSession {
    fn open_disk(&self, block_name: &str) -> Option<Box<dyn DiskHandle>> {
        let object_path = find_block(&read(&self.managed), block_name)?;
        Some(Box::new(UdisksDisk {
            block_name: block_name.to_string(),
            object_path,
            connection: self.connection.clone(),
            managed: self.managed.clone(),
        }))
    }

    fn subscribe(&self, udi: &str) -> Option<broadcast::Receiver<PropertyChange>> {
        if !read(&self.managed).contains_key(udi) {
            return None;
        }
        let mut push = self.push.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = push
            .entry(udi.to_string())
            .or_insert_with(|| broadcast::channel(PUSH_CAPACITY).0);
        Some(sender.subscribe())
    }

    fn host(&self) -> HostInfo {
        read(&self.host).clone()
    }
}

struct UdisksDisk {
    block_name: String,
    object_path: String,
    connection: Connection,
    managed: Arc<RwLock<ManagedObjects>>,
}

impl UdisksDisk {
    fn drive_path(&self) -> Option<String> {
        read(&self.managed)
            .get(&self.object_path)
            .and_then(|i| i.get(BLOCK_IFACE))
            .and_then(|b| b.get("Drive"))
            .and_then(as_object_path)
            .filter(|p| p != "/")
    }

    async fn unmount_filesystem(&self, path: &str) -> Result<(), HwError> {
        let what = format!("unmount {path}");
        let proxy = FilesystemProxy::builder(&self.connection)
            .path(path)
            .map_err(|e| map_zbus_error(&what, e))?
            .build()
            .await
            .map_err(|e| map_zbus_error(&what, e))?;
        proxy
            .unmount(HashMap::new())
            .await
            .map_err(|e| map_udisks_error(&what, e))
    }
}

#[async_trait]
impl DiskHandle for UdisksDisk {
    fn block_name(&self) -> &str {
        &self.block_name
    }

    fn describe(&self) -> Result<PropertyMap, HwError> {
        describe_block(&read(&self.managed), &self.object_path)
    }

    async fn mount(&self) -> Result<String, HwError> {
        let what = format!("mount {}", self.block_name);
        let proxy = FilesystemProxy::builder(&self.connection)
            .path(self.object_path.as_str())
            .map_err(|e| map_zbus_error(&what, e))?
            .build()
            .await
            .map_err(|e| map_zbus_error(&what, e))?;
        let mount_path = proxy
            .mount(HashMap::new())
            .await
            .map_err(|e| map_udisks_error(&what, e))?;
        info!("Mounted {} at {mount_path}", self.block_name);
        Ok(mount_path)
    }

    async fn unmount(&self, whole: bool) -> Result<(), HwError> {
        let targets = mounted_filesystems(&read(&self.managed), &self.object_path, whole);
        if targets.is_empty() {
            return Err(HwError::rejected(format!("{} is not mounted", self.block_name)));
        }

        for path in targets {
            self.unmount_filesystem(&path).await?;
        }
        info!("Unmounted {}", self.block_name);
        Ok(())
    }

    async fn eject(&self) -> Result<(), HwError> {
        let what = format!("eject {}", self.block_name);
        let Some(drive_path) = self.drive_path() else {
            warn!("{} has no drive to eject", self.block_name);
            return Err(HwError::transport(format!("{what}: no drive")));
        };

        let proxy = DriveProxy::builder(&self.connection)
            .path(drive_path.as_str())
            .map_err(|e| map_zbus_error(&what, e))?
            .build()
            .await
            .map_err(|e| map_zbus_error(&what, e))?;
        proxy
            .eject(HashMap::new())
            .await
            .map_err(|e| map_udisks_error(&what, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

    fn value<'a>(v: impl Into<Value<'a>>) -> OwnedValue {
        OwnedValue::try_from(v.into()).expect("owned value")
    }

    fn bytes(s: &str) -> OwnedValue {
        let mut raw = s.as_bytes().to_vec();
        raw.push(0);
        value(raw)
    }

    fn path(p: &str) -> OwnedValue {
        value(OwnedObjectPath::try_from(p).expect("object path"))
    }

    const DRIVE: &str = "/org/freedesktop/UDisks2/drives/SanDisk_Cruzer";
    const SDB: &str = "/org/freedesktop/UDisks2/block_devices/sdb";
    const SDB1: &str = "/org/freedesktop/UDisks2/block_devices/sdb1";

    fn stick(mount_point: Option<&str>) -> ManagedObjects {
        let mounts: Vec<Vec<u8>> = mount_point
            .map(|m| vec![format!("{m}\0").into_bytes()])
            .unwrap_or_default();

        ManagedObjects::from([
            (
                DRIVE.to_string(),
                HashMap::from([(
                    DRIVE_IFACE.to_string(),
                    HashMap::from([
                        ("Vendor".to_string(), value("SanDisk")),
                        ("Model".to_string(), value("Cruzer")),
                        ("ConnectionBus".to_string(), value("usb")),
                        ("Removable".to_string(), value(true)),
                    ]),
                )]),
            ),
            (
                SDB.to_string(),
                HashMap::from([(
                    BLOCK_IFACE.to_string(),
                    HashMap::from([
                        ("Device".to_string(), bytes("/dev/sdb")),
                        ("Drive".to_string(), path(DRIVE)),
                    ]),
                )]),
            ),
            (
                SDB1.to_string(),
                HashMap::from([
                    (
                        BLOCK_IFACE.to_string(),
                        HashMap::from([
                            ("Device".to_string(), bytes("/dev/sdb1")),
                            ("Drive".to_string(), path(DRIVE)),
                            ("IdType".to_string(), value("vfat")),
                            ("IdLabel".to_string(), value("STICK")),
                        ]),
                    ),
                    (
                        PARTITION_IFACE.to_string(),
                        HashMap::from([("Table".to_string(), path(SDB))]),
                    ),
                    (
                        FILESYSTEM_IFACE.to_string(),
                        HashMap::from([("MountPoints".to_string(), value(mounts))]),
                    ),
                ]),
            ),
        ])
    }

    #[test]
    fn finds_blocks_by_kernel_name() {
        let managed = stick(None);
        assert_eq!(find_block(&managed, "sdb1").as_deref(), Some(SDB1));
        assert_eq!(find_block(&managed, "sdb").as_deref(), Some(SDB));
        assert!(find_block(&managed, "sdc").is_none());
    }

    #[test]
    fn describes_mounted_partition() {
        let description =
            describe_block(&stick(Some("/run/media/me/STICK")), SDB1).expect("description");

        assert_eq!(description.get_str(da::VOLUME_PATH), Some("/run/media/me/STICK"));
        assert_eq!(description.get_str(da::VOLUME_KIND), Some("vfat"));
        assert_eq!(description.get_str(da::VOLUME_NAME), Some("STICK"));
        assert_eq!(description.get_str(da::DEVICE_VENDOR), Some("SanDisk"));
        assert_eq!(description.get_str(da::DEVICE_PROTOCOL), Some("USB"));
        assert_eq!(description.get_bool(da::DEVICE_INTERNAL), Some(false));
    }

    #[test]
    fn vanished_block_is_a_transport_failure() {
        let error = describe_block(&stick(None), "/org/freedesktop/UDisks2/block_devices/sdz")
            .expect_err("missing block");
        assert_eq!(error.kind, hwkit_contracts::HwErrorKind::TransportFailure);
    }

    #[test]
    fn whole_disk_unmount_covers_partitions() {
        let managed = stick(Some("/run/media/me/STICK"));
        assert_eq!(mounted_filesystems(&managed, SDB, true), vec![SDB1.to_string()]);
        assert!(mounted_filesystems(&managed, SDB, false).is_empty());
        assert!(mounted_filesystems(&stick(None), SDB, true).is_empty());
    }

    #[test]
    fn mount_changes_are_reported_per_udi() {
        let unmounted = stick(None);
        let mounted = stick(Some("/run/media/me/STICK"));

        let changes = volume_path_changes(&unmounted, &mounted, [SDB1, SDB]);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].udi, SDB1);
        assert_eq!(
            changes[0].value.as_ref().and_then(|v| v.as_str()),
            Some("/run/media/me/STICK")
        );

        let changes = volume_path_changes(&mounted, &unmounted, [SDB1]);
        assert_eq!(changes[0].value, None);
        assert!(volume_path_changes(&mounted, &mounted, [SDB1]).is_empty());
    }
}
