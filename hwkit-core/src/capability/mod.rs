// SPDX-License-Identifier: GPL-3.0-only

//! Typed capability views over a [`DeviceNode`](crate::DeviceNode).
//!
//! Every view borrows its device; none of them is cached, so creating and
//! dropping them repeatedly is cheap and safe. Views backed by a native
//! disk handle release it on drop.

mod battery;
mod block;
mod generic;
mod optical_drive;
mod processor;
mod storage_access;
mod storage_drive;
mod storage_volume;

pub use battery::Battery;
pub use block::Block;
pub use generic::GenericInterface;
pub use optical_drive::{OpticalDrive, media_from_features};
pub use processor::Processor;
pub use storage_access::StorageAccess;
pub use storage_drive::StorageDrive;
pub use storage_volume::StorageVolume;

use tracing::{debug, warn};

use hwkit_contracts::DiskHandle;
use hwkit_types::PropertyMap;

use crate::device::DeviceNode;

pub(crate) fn block_name(device: &DeviceNode) -> Option<&str> {
    device
        .properties()
        .get_str(&device.backend().profile().block_name_key)
}

pub(crate) fn open_disk(device: &DeviceNode) -> Option<Box<dyn DiskHandle>> {
    let name = block_name(device)?;
    let disk = device.backend().session().open_disk(name);
    if disk.is_none() {
        warn!("Could not open disk {name} for {}", device.udi());
    }
    disk
}

/// One-shot disk description, empty when unavailable.
pub(crate) fn snapshot_description(disk: Option<&dyn DiskHandle>, udi: &str) -> PropertyMap {
    let Some(disk) = disk else {
        return PropertyMap::new();
    };

    disk.describe().unwrap_or_else(|e| {
        debug!("No disk description for {udi}: {e}");
        PropertyMap::new()
    })
}
