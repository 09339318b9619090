// SPDX-License-Identifier: GPL-3.0-only

use std::future::Future;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use hwkit_contracts::{DeviceEvent, DiskHandle, HwError, OperationKind, PropertyChange};
use hwkit_types::keys::{self, description as da};
use hwkit_types::{DeviceInterfaceType, PropertyMap, PropertyValue};

use super::open_disk;
use crate::device::DeviceNode;
use crate::operation::{bounded, busy, kind_label, report_outcome};

/// Mount state of a drive or volume.
///
/// The mount path is never trusted from cache: every [`file_path`] call
/// asks the native session again and emits
/// [`DeviceEvent::AccessibilityChanged`] when the answer differs from the
/// last one observed on this device.
///
/// [`file_path`]: StorageAccess::file_path
pub struct StorageAccess<'a> {
    device: &'a DeviceNode,
    disk: Option<Box<dyn DiskHandle>>,
}

impl<'a> StorageAccess<'a> {
    pub fn new(device: &'a DeviceNode) -> Self {
        Self {
            device,
            disk: open_disk(device),
        }
    }

    fn disk(&self) -> Result<&dyn DiskHandle, HwError> {
        self.disk
            .as_deref()
            .ok_or_else(|| HwError::transport(format!("no disk handle for {}", self.device.udi())))
    }

    /// Current mount path, `None` when not mounted.
    pub fn file_path(&self) -> Result<Option<String>, HwError> {
        let description = self.disk()?.describe()?;
        let mount_path = description
            .get_str(da::VOLUME_PATH)
            .filter(|path| !path.is_empty())
            .map(str::to_string);

        self.record_mount_state(mount_path.clone());
        Ok(mount_path)
    }

    pub fn is_accessible(&self) -> Result<bool, HwError> {
        self.file_path()?;
        Ok(self.device.access_cache().is_mounted == Some(true))
    }

    /// Whether the volume should be hidden from users.
    pub fn is_ignored(&self) -> bool {
        let mut cache = self.device.access_cache();
        if let Some(open) = self.device.properties().get_bool(keys::OPEN) {
            cache.is_ignored = Some(!open);
        }
        cache.is_ignored.unwrap_or(false)
    }

    /// Mount the volume. `false` when it already is mounted or the mount failed;
    /// the outcome is also broadcast as [`DeviceEvent::OperationDone`].
    pub async fn setup(&self) -> bool {
        self.mount().await.is_ok()
    }

    /// Unmount the volume. `false` when it is not mounted or the unmount failed.
    pub async fn teardown(&self) -> bool {
        self.unmount().await.is_ok()
    }

    /// Mount and return the new mount path.
    ///
    /// Already-mounted volumes are rejected without contacting the native
    /// session or emitting a completion event.
    pub async fn mount(&self) -> Result<String, HwError> {
        let disk = self.disk()?;
        if self.is_accessible()? {
            return Err(HwError::rejected(format!(
                "{} is already accessible",
                self.device.udi()
            )));
        }

        self.run(OperationKind::Setup, disk.mount()).await
    }

    pub async fn unmount(&self) -> Result<(), HwError> {
        let disk = self.disk()?;
        if !self.is_accessible()? {
            return Err(HwError::rejected(format!(
                "{} is not accessible",
                self.device.udi()
            )));
        }

        let whole = self
            .device
            .device_types()
            .contains(DeviceInterfaceType::StorageDrive);
        self.run(OperationKind::Teardown, disk.unmount(whole)).await
    }

    async fn run<T>(
        &self,
        kind: OperationKind,
        op: impl Future<Output = Result<T, HwError>>,
    ) -> Result<T, HwError> {
        let deadline = self.device.backend().settings().operation_timeout();
        let result = match self.device.begin_operation() {
            Some(_guard) => bounded(deadline, kind_label(kind), op).await,
            None => Err(busy(self.device)),
        };

        if let Err(e) = self.file_path() {
            debug!("Could not refresh mount state of {}: {e}", self.device.udi());
        }

        report_outcome(
            self.device,
            kind,
            result.as_ref().map(|_| ()).map_err(Clone::clone),
        );
        result
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.device.subscribe()
    }

    /// Apply one pushed property change to the cached mount state.
    pub fn apply_change(&self, change: &PropertyChange) {
        if change.udi != self.device.udi() || change.key != da::VOLUME_PATH {
            return;
        }

        let mount_path = change
            .value
            .as_ref()
            .and_then(PropertyValue::as_str)
            .filter(|path| !path.is_empty())
            .map(str::to_string);
        self.record_mount_state(mount_path);
    }

    /// Follow the native push channel until it closes.
    ///
    /// Fails with `UnsupportedCapability` when the backend has no push channel.
    pub async fn follow_changes(&self) -> Result<(), HwError> {
        let udi = self.device.udi();
        let Some(mut receiver) = self.device.backend().session().subscribe(udi) else {
            return Err(HwError::unsupported(udi, "property change notifications"));
        };

        loop {
            match receiver.recv().await {
                Ok(change) => self.apply_change(&change),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Missed {missed} property changes for {udi}, re-reading");
                    if let Err(e) = self.file_path() {
                        warn!("Could not re-read mount state of {udi}: {e}");
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            }
        }
    }

    fn record_mount_state(&self, mount_path: Option<String>) {
        let mounted = mount_path.is_some();
        let previous = {
            let mut cache = self.device.access_cache();
            cache.mount_path = mount_path;
            cache.is_mounted.replace(mounted)
        };

        if previous.is_some_and(|was| was != mounted) {
            debug!(udi = self.device.udi(), mounted, "Accessibility changed");
            self.device.emit(DeviceEvent::AccessibilityChanged {
                udi: self.device.udi().to_string(),
                accessible: mounted,
            });
        }
    }

    pub fn report(&self) -> Result<PropertyMap, HwError> {
        let path = self.file_path()?;
        Ok(PropertyMap::new()
            .with("accessible", path.is_some())
            .with("filePath", path.unwrap_or_default())
            .with("ignored", self.is_ignored()))
    }
}
