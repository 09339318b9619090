// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatteryType {
    Unknown,
    Primary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeState {
    NoCharge,
    Charging,
    Discharging,
    FullyCharged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Technology {
    Unknown,
    LithiumIon,
    LithiumPolymer,
}

impl BatteryType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UnknownBattery",
            Self::Primary => "PrimaryBattery",
        }
    }
}

impl ChargeState {
    pub fn name(self) -> &'static str {
        match self {
            Self::NoCharge => "NoCharge",
            Self::Charging => "Charging",
            Self::Discharging => "Discharging",
            Self::FullyCharged => "FullyCharged",
        }
    }
}

impl Technology {
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UnknownTechnology",
            Self::LithiumIon => "LithiumIon",
            Self::LithiumPolymer => "LithiumPolymer",
        }
    }
}
