// SPDX-License-Identifier: GPL-3.0-only

//! On-demand creation of capability views.

use hwkit_contracts::HwError;
use hwkit_types::{DeviceInterfaceType, PropertyMap, TypeSet};

use crate::capability::{
    Battery, Block, GenericInterface, OpticalDrive, Processor, StorageAccess, StorageDrive,
    StorageVolume,
};
use crate::device::DeviceNode;

/// A freshly created capability view.
pub enum DeviceInterface<'a> {
    Generic(GenericInterface<'a>),
    Processor(Processor<'a>),
    Battery(Battery<'a>),
    Block(Block<'a>),
    StorageAccess(StorageAccess<'a>),
    StorageDrive(StorageDrive<'a>),
    OpticalDrive(OpticalDrive<'a>),
    StorageVolume(StorageVolume<'a>),
}

impl DeviceInterface<'_> {
    pub fn interface_type(&self) -> DeviceInterfaceType {
        match self {
            Self::Generic(_) => DeviceInterfaceType::GenericInterface,
            Self::Processor(_) => DeviceInterfaceType::Processor,
            Self::Battery(_) => DeviceInterfaceType::Battery,
            Self::Block(_) => DeviceInterfaceType::Block,
            Self::StorageAccess(_) => DeviceInterfaceType::StorageAccess,
            Self::StorageDrive(_) => DeviceInterfaceType::StorageDrive,
            Self::OpticalDrive(_) => DeviceInterfaceType::OpticalDrive,
            Self::StorageVolume(_) => DeviceInterfaceType::StorageVolume,
        }
    }

    /// Property dump keyed by the capability's property names.
    pub fn report(&self) -> Result<PropertyMap, HwError> {
        Ok(match self {
            Self::Generic(i) => i.report(),
            Self::Processor(i) => i.report(),
            Self::Battery(i) => i.report(),
            Self::Block(i) => i.report(),
            Self::StorageAccess(i) => i.report()?,
            Self::StorageDrive(i) => i.report(),
            Self::OpticalDrive(i) => i.report(),
            Self::StorageVolume(i) => i.report(),
        })
    }
}

fn is_storage(types: TypeSet) -> bool {
    types.intersects(DeviceInterfaceType::StorageDrive | DeviceInterfaceType::StorageVolume)
}

/// Whether `device` offers `interface`.
///
/// `StorageAccess` and `Block` are derived from the storage tags; every
/// other capability is plain type-set membership.
pub fn supports(device: &DeviceNode, interface: DeviceInterfaceType) -> bool {
    match interface {
        DeviceInterfaceType::GenericInterface => true,
        DeviceInterfaceType::StorageAccess | DeviceInterfaceType::Block => {
            is_storage(device.device_types())
        }
        other => device.device_types().contains(other),
    }
}

/// Build a new view of `interface`, or `None` when the device does not
/// support it. Nothing is cached.
pub fn create(device: &DeviceNode, interface: DeviceInterfaceType) -> Option<DeviceInterface<'_>> {
    if !supports(device, interface) {
        return None;
    }

    let created = match interface {
        DeviceInterfaceType::GenericInterface => {
            DeviceInterface::Generic(GenericInterface::new(device))
        }
        DeviceInterfaceType::Processor => DeviceInterface::Processor(Processor::new(device)),
        DeviceInterfaceType::Battery => DeviceInterface::Battery(Battery::new(device)),
        DeviceInterfaceType::Block => DeviceInterface::Block(Block::new(device)),
        DeviceInterfaceType::StorageAccess => {
            DeviceInterface::StorageAccess(StorageAccess::new(device))
        }
        DeviceInterfaceType::StorageDrive => {
            DeviceInterface::StorageDrive(StorageDrive::new(device))
        }
        DeviceInterfaceType::OpticalDrive => {
            DeviceInterface::OpticalDrive(OpticalDrive::new(device))
        }
        DeviceInterfaceType::StorageVolume => {
            DeviceInterface::StorageVolume(StorageVolume::new(device))
        }
        DeviceInterfaceType::Unknown => return None,
    };
    Some(created)
}

impl DeviceNode {
    pub fn supports(&self, interface: DeviceInterfaceType) -> bool {
        supports(self, interface)
    }

    pub fn interface(&self, interface: DeviceInterfaceType) -> Option<DeviceInterface<'_>> {
        create(self, interface)
    }

    /// Every supported capability, in declaration order.
    pub fn interfaces(&self) -> Vec<DeviceInterfaceType> {
        DeviceInterfaceType::ALL
            .into_iter()
            .filter(|t| self.supports(*t))
            .collect()
    }

    pub fn as_storage_access(&self) -> Option<StorageAccess<'_>> {
        self.supports(DeviceInterfaceType::StorageAccess)
            .then(|| StorageAccess::new(self))
    }

    pub fn as_storage_drive(&self) -> Option<StorageDrive<'_>> {
        self.supports(DeviceInterfaceType::StorageDrive)
            .then(|| StorageDrive::new(self))
    }

    pub fn as_storage_volume(&self) -> Option<StorageVolume<'_>> {
        self.supports(DeviceInterfaceType::StorageVolume)
            .then(|| StorageVolume::new(self))
    }

    pub fn as_optical_drive(&self) -> Option<OpticalDrive<'_>> {
        self.supports(DeviceInterfaceType::OpticalDrive)
            .then(|| OpticalDrive::new(self))
    }

    pub fn as_block(&self) -> Option<Block<'_>> {
        self.supports(DeviceInterfaceType::Block)
            .then(|| Block::new(self))
    }

    pub fn as_processor(&self) -> Option<Processor<'_>> {
        self.supports(DeviceInterfaceType::Processor)
            .then(|| Processor::new(self))
    }

    pub fn as_battery(&self) -> Option<Battery<'_>> {
        self.supports(DeviceInterfaceType::Battery)
            .then(|| Battery::new(self))
    }
}
