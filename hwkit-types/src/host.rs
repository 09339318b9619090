// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// Machine-wide facts that are not attached to any registry entry.
///
/// The root device reports `vendor` and `model`; processors report the CPU
/// fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostInfo {
    /// Machine vendor (e.g. "Apple", "LENOVO")
    pub vendor: String,

    /// Machine model identifier (e.g. "MacBookPro11,3")
    pub model: String,

    /// Whether the chassis is a laptop or other portable machine
    pub portable: bool,

    pub cpu_vendor: String,
    pub cpu_brand: String,

    /// Nominal CPU frequency in MHz
    pub cpu_frequency_mhz: u64,
    pub cpu_min_frequency_mhz: u64,
    pub cpu_max_frequency_mhz: u64,

    /// Raw CPU feature flags as the platform spells them
    pub cpu_features: Vec<String>,
}
