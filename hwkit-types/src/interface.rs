// SPDX-License-Identifier: GPL-3.0-only

use enumflags2::{BitFlags, bitflags};
use serde::{Deserialize, Serialize};

/// Semantic capability tags a device can carry.
#[bitflags]
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceInterfaceType {
    Unknown = 1 << 0,
    GenericInterface = 1 << 1,
    Processor = 1 << 2,
    Battery = 1 << 3,
    Block = 1 << 4,
    StorageAccess = 1 << 5,
    StorageDrive = 1 << 6,
    OpticalDrive = 1 << 7,
    StorageVolume = 1 << 8,
}

/// Set of capability tags attached to a device.
pub type TypeSet = BitFlags<DeviceInterfaceType>;

impl DeviceInterfaceType {
    /// Every concrete capability, in declaration order.
    pub const ALL: [DeviceInterfaceType; 8] = [
        Self::GenericInterface,
        Self::Processor,
        Self::Battery,
        Self::Block,
        Self::StorageAccess,
        Self::StorageDrive,
        Self::OpticalDrive,
        Self::StorageVolume,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::GenericInterface => "GenericInterface",
            Self::Processor => "Processor",
            Self::Battery => "Battery",
            Self::Block => "Block",
            Self::StorageAccess => "StorageAccess",
            Self::StorageDrive => "StorageDrive",
            Self::OpticalDrive => "OpticalDrive",
            Self::StorageVolume => "StorageVolume",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        std::iter::once(Self::Unknown)
            .chain(Self::ALL)
            .find(|t| t.name() == name)
    }
}

impl std::fmt::Display for DeviceInterfaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
