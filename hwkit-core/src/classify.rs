// SPDX-License-Identifier: GPL-3.0-only

//! Derives a device's capability tags from raw registry data.

use hwkit_types::{DeviceInterfaceType, PropertyMap, TypeSet, keys};

use crate::profile::ClassProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub types: TypeSet,
    pub main_type: DeviceInterfaceType,
}

/// Classify one registry entry.
///
/// Class conformance is tested in a fixed order (processor, battery,
/// optical media); the first match sets the main type. Block devices add
/// `StorageDrive` for whole disks (`Leaf == false`) and `StorageVolume`
/// otherwise, claiming the main type only if nothing else did. An
/// unclassified entry ends up with `{Unknown}`.
pub fn classify(
    conforms_to: impl Fn(&str) -> bool,
    properties: &PropertyMap,
    profile: &ClassProfile,
) -> Classification {
    let mut types = TypeSet::empty();
    let mut main_type = DeviceInterfaceType::Unknown;

    let matches = |classes: &[String]| classes.iter().any(|c| conforms_to(c.as_str()));

    if matches(profile.processor_classes.as_slice()) {
        types |= DeviceInterfaceType::Processor;
        main_type = DeviceInterfaceType::Processor;
    } else if matches(profile.battery_classes.as_slice()) {
        types |= DeviceInterfaceType::Battery;
        main_type = DeviceInterfaceType::Battery;
    } else if matches(profile.optical_classes.as_slice()) {
        types |= DeviceInterfaceType::OpticalDrive;
        main_type = DeviceInterfaceType::OpticalDrive;
    }

    if let Some(name) = properties.get_str(&profile.block_name_key)
        && profile.is_block_name(name)
    {
        let storage = if properties.get_bool(keys::LEAF) == Some(false) {
            DeviceInterfaceType::StorageDrive
        } else {
            DeviceInterfaceType::StorageVolume
        };
        types |= storage;
        if main_type == DeviceInterfaceType::Unknown {
            main_type = storage;
        }
    }

    if types.is_empty() {
        types |= main_type;
    }

    Classification { types, main_type }
}
