// SPDX-License-Identifier: GPL-3.0-only

use hwkit_types::keys::battery as key;
use hwkit_types::{BatteryType, ChargeState, PropertyMap, Technology};

use crate::device::DeviceNode;

/// A smart battery.
pub struct Battery<'a> {
    device: &'a DeviceNode,
}

impl<'a> Battery<'a> {
    pub fn new(device: &'a DeviceNode) -> Self {
        Self { device }
    }

    fn props(&self) -> &PropertyMap {
        self.device.properties()
    }

    pub fn is_present(&self) -> bool {
        self.props().get_bool(key::INSTALLED).unwrap_or(true)
    }

    pub fn battery_type(&self) -> BatteryType {
        BatteryType::Primary
    }

    /// Current charge relative to the current full-charge capacity.
    pub fn charge_percent(&self) -> i64 {
        let current = self.props().get_int(key::CURRENT_CAPACITY).unwrap_or(0);
        match self.props().get_int(key::MAX_CAPACITY) {
            Some(max) if max > 0 => (current * 100 / max).clamp(0, 100),
            _ => 0,
        }
    }

    /// Full-charge capacity relative to the design capacity.
    pub fn capacity(&self) -> i64 {
        let max = self.props().get_int(key::MAX_CAPACITY).unwrap_or(0);
        match self.props().get_int(key::DESIGN_CAPACITY) {
            Some(design) if design > 0 => (max * 100 / design).clamp(0, 100),
            _ => 100,
        }
    }

    pub fn is_rechargeable(&self) -> bool {
        true
    }

    pub fn is_power_supply(&self) -> bool {
        true
    }

    pub fn charge_state(&self) -> ChargeState {
        let props = self.props();
        if props.get_bool(key::IS_CHARGING).unwrap_or(false) {
            ChargeState::Charging
        } else if props.get_bool(key::FULLY_CHARGED).unwrap_or(false) {
            ChargeState::FullyCharged
        } else if props.get_bool(key::EXTERNAL_CONNECTED).unwrap_or(false) {
            ChargeState::NoCharge
        } else {
            ChargeState::Discharging
        }
    }

    /// Volts; the registry reports millivolts.
    pub fn voltage(&self) -> f64 {
        self.props().get_int(key::VOLTAGE).unwrap_or(0) as f64 / 1000.0
    }

    pub fn serial(&self) -> String {
        self.props().string_or_empty(key::SERIAL)
    }

    pub fn cycle_count(&self) -> i64 {
        self.props().get_int(key::CYCLE_COUNT).unwrap_or(0)
    }

    pub fn technology(&self) -> Technology {
        Technology::LithiumIon
    }

    pub fn vendor(&self) -> String {
        self.props().string_or_empty(key::MANUFACTURER)
    }

    pub fn product(&self) -> String {
        self.props().string_or_empty(key::DEVICE_NAME)
    }

    pub fn description(&self) -> String {
        "Smart Battery".to_string()
    }

    pub fn report(&self) -> PropertyMap {
        PropertyMap::new()
            .with("present", self.is_present())
            .with("type", self.battery_type().name())
            .with("chargePercent", self.charge_percent())
            .with("capacity", self.capacity())
            .with("rechargeable", self.is_rechargeable())
            .with("powerSupply", self.is_power_supply())
            .with("chargeState", self.charge_state().name())
            .with("voltage", self.voltage())
            .with("serial", self.serial())
            .with("cycleCount", self.cycle_count())
            .with("technology", self.technology().name())
    }
}
