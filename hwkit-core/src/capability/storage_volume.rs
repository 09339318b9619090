// SPDX-License-Identifier: GPL-3.0-only

use hwkit_contracts::DiskHandle;
use hwkit_types::keys::{self, description as da};
use hwkit_types::{PropertyMap, VolumeUsage};

use super::{open_disk, snapshot_description};
use crate::device::{DEFAULT_ICON, DeviceNode};

/// A partition or other leaf block device.
pub struct StorageVolume<'a> {
    device: &'a DeviceNode,
    _disk: Option<Box<dyn DiskHandle>>,
    description: PropertyMap,
}

impl<'a> StorageVolume<'a> {
    pub fn new(device: &'a DeviceNode) -> Self {
        let disk = open_disk(device);
        let description = snapshot_description(disk.as_deref(), device.udi());
        Self {
            device,
            _disk: disk,
            description,
        }
    }

    /// Volumes nobody opened (no filesystem driver attached) are ignored.
    pub fn is_ignored(&self) -> bool {
        self.device.properties().get_bool(keys::OPEN) == Some(false)
    }

    pub fn usage(&self) -> VolumeUsage {
        if self.device.properties().get_str(keys::CONTENT) == Some(keys::CONTENT_AUDIO_CD) {
            VolumeUsage::Other
        } else {
            VolumeUsage::FileSystem
        }
    }

    pub fn fs_type(&self) -> String {
        self.description.string_or_empty(da::VOLUME_KIND)
    }

    pub fn label(&self) -> String {
        self.description.string_or_empty(da::VOLUME_NAME)
    }

    pub fn uuid(&self) -> String {
        self.device.properties().string_or_empty(keys::UUID)
    }

    pub fn size(&self) -> i64 {
        self.device.properties().get_int(keys::SIZE).unwrap_or(0)
    }

    pub fn encrypted_container_udi(&self) -> String {
        String::new()
    }

    pub fn vendor(&self) -> String {
        self.description.string_or_empty(da::DEVICE_VENDOR)
    }

    pub fn product(&self) -> String {
        self.description.string_or_empty(da::DEVICE_MODEL)
    }

    pub fn description(&self) -> String {
        let label = self.label();
        if !label.is_empty() {
            return label;
        }
        let media = self.description.string_or_empty(da::MEDIA_NAME);
        if media.is_empty() { "Volume".to_string() } else { media }
    }

    pub fn icon(&self) -> String {
        match self.usage() {
            VolumeUsage::Other => "media-optical".to_string(),
            _ => DEFAULT_ICON.to_string(),
        }
    }

    pub fn report(&self) -> PropertyMap {
        PropertyMap::new()
            .with("ignored", self.is_ignored())
            .with("usage", self.usage().name())
            .with("fsType", self.fs_type())
            .with("label", self.label())
            .with("uuid", self.uuid())
            .with("size", self.size())
    }
}
