// SPDX-License-Identifier: GPL-3.0-only

use hwkit_types::{InstructionSets, PropertyMap, instruction_sets_from_features, keys};

use crate::device::DeviceNode;

/// A CPU core. Per-core data comes from the registry, the rest from the host.
pub struct Processor<'a> {
    device: &'a DeviceNode,
}

impl<'a> Processor<'a> {
    pub fn new(device: &'a DeviceNode) -> Self {
        Self { device }
    }

    pub fn number(&self) -> i64 {
        self.device.properties().get_int(keys::CPU_NUMBER).unwrap_or(0)
    }

    /// Maximum clock in MHz, 0 when unknown.
    pub fn max_speed(&self) -> u64 {
        let host = self.device.host();
        if host.cpu_max_frequency_mhz > 0 {
            host.cpu_max_frequency_mhz
        } else {
            host.cpu_frequency_mhz
        }
    }

    pub fn can_change_frequency(&self) -> bool {
        let host = self.device.host();
        host.cpu_min_frequency_mhz > 0 && host.cpu_max_frequency_mhz > host.cpu_min_frequency_mhz
    }

    pub fn instruction_sets(&self) -> InstructionSets {
        let host = self.device.host();
        instruction_sets_from_features(host.cpu_features.iter().map(String::as_str))
    }

    pub fn vendor(&self) -> String {
        self.device.host().cpu_vendor
    }

    pub fn product(&self) -> String {
        self.device.host().cpu_brand
    }

    pub fn description(&self) -> String {
        let product = self.product();
        if product.is_empty() {
            format!("Processor {}", self.number())
        } else {
            product
        }
    }

    pub fn report(&self) -> PropertyMap {
        let sets: Vec<&str> = self.instruction_sets().iter().map(|s| s.name()).collect();
        PropertyMap::new()
            .with("number", self.number())
            .with("maxSpeed", self.max_speed())
            .with("canChangeFrequency", self.can_change_frequency())
            .with("instructionSets", sets)
    }
}
