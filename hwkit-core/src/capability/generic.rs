// SPDX-License-Identifier: GPL-3.0-only

use hwkit_types::{PropertyMap, PropertyValue};

use crate::device::DeviceNode;

/// Raw access to a device's registry properties.
pub struct GenericInterface<'a> {
    device: &'a DeviceNode,
}

impl<'a> GenericInterface<'a> {
    pub fn new(device: &'a DeviceNode) -> Self {
        Self { device }
    }

    pub fn property(&self, key: &str) -> Option<PropertyValue> {
        self.device.property(key)
    }

    pub fn all_properties(&self) -> PropertyMap {
        self.device.properties().clone()
    }

    pub fn property_exists(&self, key: &str) -> bool {
        self.device.property_exists(key)
    }

    pub fn report(&self) -> PropertyMap {
        PropertyMap::new()
    }
}
