// SPDX-License-Identifier: GPL-3.0-only

use serde::Serialize;

use hwkit_contracts::HwError;
use hwkit_types::{DeviceInterfaceType, PropertyMap};

use crate::device::DeviceNode;

/// Everything `describe` shows about one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceReport {
    pub udi: String,
    pub parent_udi: String,
    pub vendor: String,
    pub product: String,
    pub description: String,
    pub icon: String,
    pub emblems: Vec<String>,
    pub main_type: DeviceInterfaceType,
    pub interfaces: Vec<InterfaceReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceReport {
    pub interface: DeviceInterfaceType,
    pub properties: PropertyMap,
}

impl DeviceNode {
    pub fn report(&self) -> Result<DeviceReport, HwError> {
        let mut interfaces = Vec::new();
        for interface in self.interfaces() {
            if interface == DeviceInterfaceType::GenericInterface {
                continue;
            }
            if let Some(view) = self.interface(interface) {
                interfaces.push(InterfaceReport {
                    interface,
                    properties: view.report()?,
                });
            }
        }

        Ok(DeviceReport {
            udi: self.udi().to_string(),
            parent_udi: self.parent_udi().to_string(),
            vendor: self.vendor(),
            product: self.product(),
            description: self.description(),
            icon: self.icon(),
            emblems: self.emblems(),
            main_type: self.main_type(),
            interfaces,
        })
    }
}
