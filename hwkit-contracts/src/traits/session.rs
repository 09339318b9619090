// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;
use tokio::sync::broadcast;

use hwkit_types::{HostInfo, PropertyMap};

use crate::{HwError, PropertyChange};

/// Native handle on one disk, released on drop.
#[async_trait]
pub trait DiskHandle: Send + Sync {
    fn block_name(&self) -> &str;

    /// Current disk description (`keys::description`). Re-read on every call.
    fn describe(&self) -> Result<PropertyMap, HwError>;

    /// Mount the disk's volume, returning the mount path.
    async fn mount(&self) -> Result<String, HwError>;

    /// Unmount the volume, or every volume on the disk when `whole` is set.
    async fn unmount(&self, whole: bool) -> Result<(), HwError>;

    async fn eject(&self) -> Result<(), HwError>;
}

/// Process-wide session with the native volume manager.
pub trait NativeSession: Send + Sync {
    /// Open a handle for a block device name (e.g. `disk3`, `sr0`).
    fn open_disk(&self, block_name: &str) -> Option<Box<dyn DiskHandle>>;

    /// Push channel for property changes on `udi`, when the backend has one.
    fn subscribe(&self, udi: &str) -> Option<broadcast::Receiver<PropertyChange>>;

    fn host(&self) -> HostInfo;
}
