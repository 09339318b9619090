// SPDX-License-Identifier: GPL-3.0-only

use hwkit_types::{PropertyMap, keys};

use super::block_name;
use crate::device::DeviceNode;

pub struct Block<'a> {
    device: &'a DeviceNode,
}

impl<'a> Block<'a> {
    pub fn new(device: &'a DeviceNode) -> Self {
        Self { device }
    }

    pub fn device_major(&self) -> i64 {
        self.device.properties().get_int(keys::BSD_MAJOR).unwrap_or(0)
    }

    pub fn device_minor(&self) -> i64 {
        self.device.properties().get_int(keys::BSD_MINOR).unwrap_or(0)
    }

    /// Device node path, e.g. `/dev/disk3`.
    pub fn device(&self) -> String {
        block_name(self.device)
            .map(|name| format!("/dev/{name}"))
            .unwrap_or_default()
    }

    pub fn report(&self) -> PropertyMap {
        PropertyMap::new()
            .with("major", self.device_major())
            .with("minor", self.device_minor())
            .with("device", self.device())
    }
}
