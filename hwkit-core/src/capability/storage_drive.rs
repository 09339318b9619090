// SPDX-License-Identifier: GPL-3.0-only

use hwkit_contracts::DiskHandle;
use hwkit_types::keys::{self, description as da};
use hwkit_types::{Bus, DeviceInterfaceType, DriveType, PropertyMap};

use super::{block_name, open_disk, snapshot_description};
use crate::device::{DEFAULT_ICON, DeviceNode};

/// A whole disk.
///
/// The disk description is captured once when the view is created.
pub struct StorageDrive<'a> {
    device: &'a DeviceNode,
    disk: Option<Box<dyn DiskHandle>>,
    description: PropertyMap,
}

impl<'a> StorageDrive<'a> {
    pub fn new(device: &'a DeviceNode) -> Self {
        let disk = open_disk(device);
        let description = snapshot_description(disk.as_deref(), device.udi());
        Self {
            device,
            disk,
            description,
        }
    }

    pub fn device(&self) -> &'a DeviceNode {
        self.device
    }

    pub(crate) fn disk(&self) -> Option<&dyn DiskHandle> {
        self.disk.as_deref()
    }

    pub fn bus(&self) -> Bus {
        let udi = self.device.udi();
        if udi.contains("/SATA@") {
            Bus::Sata
        } else if udi.contains("/SDXC@") || udi.contains("/IOUSBInterface@") {
            Bus::Usb
        } else {
            match self.description.get_str(da::DEVICE_PROTOCOL) {
                Some("USB") => Bus::Usb,
                Some("SATA") => Bus::Sata,
                Some("FireWire") => Bus::Ieee1394,
                Some("SCSI") => Bus::Scsi,
                Some("ATA" | "IDE") => Bus::Ide,
                _ => Bus::Platform,
            }
        }
    }

    pub fn drive_type(&self) -> DriveType {
        if self
            .device
            .device_types()
            .contains(DeviceInterfaceType::OpticalDrive)
        {
            DriveType::CdromDrive
        } else if self.device.udi().contains("/SDXC@")
            || block_name(self.device).is_some_and(|name| name.starts_with("mmcblk"))
        {
            DriveType::SdMmc
        } else if self.description.get_str(da::DEVICE_MODEL) == Some("Compact Flash") {
            DriveType::CompactFlash
        } else {
            DriveType::HardDisk
        }
    }

    pub fn is_removable(&self) -> bool {
        let external = self.description.get_bool(da::DEVICE_INTERNAL) == Some(false);
        external
            || self
                .device
                .properties()
                .get_bool(keys::REMOVABLE)
                .unwrap_or(false)
    }

    pub fn is_hotpluggable(&self) -> bool {
        self.bus() == Bus::Usb
            || matches!(self.drive_type(), DriveType::CdromDrive | DriveType::SdMmc)
    }

    pub fn size(&self) -> i64 {
        self.device.properties().get_int(keys::SIZE).unwrap_or(0)
    }

    pub fn vendor(&self) -> String {
        self.description.string_or_empty(da::DEVICE_VENDOR)
    }

    pub fn product(&self) -> String {
        self.description.string_or_empty(da::DEVICE_MODEL)
    }

    pub fn description(&self) -> String {
        let media = self.description.string_or_empty(da::MEDIA_NAME);
        if media.is_empty() { self.product() } else { media }
    }

    pub fn icon(&self) -> String {
        let icon = match self.drive_type() {
            DriveType::Floppy => "media-floppy",
            DriveType::CdromDrive => "drive-optical",
            DriveType::SdMmc => "media-flash-sd-mmc",
            DriveType::CompactFlash => "media-flash-cf",
            _ if self.bus() == Bus::Usb => "drive-removable-media-usb",
            _ if self.is_removable() => "drive-removable-media",
            _ => DEFAULT_ICON,
        };
        icon.to_string()
    }

    pub fn report(&self) -> PropertyMap {
        PropertyMap::new()
            .with("bus", self.bus().name())
            .with("driveType", self.drive_type().name())
            .with("removable", self.is_removable())
            .with("hotpluggable", self.is_hotpluggable())
            .with("size", self.size())
    }
}
