// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

use hwkit_types::keys;

/// Platform-specific inputs of the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassProfile {
    pub processor_classes: Vec<String>,
    pub battery_classes: Vec<String>,
    pub optical_classes: Vec<String>,

    /// Property holding the block device name.
    pub block_name_key: String,

    /// Block device names start with one of these.
    pub block_prefixes: Vec<String>,

    /// Ancestor depth at which optical drives usually carry `Device Characteristics`.
    pub characteristics_depth: usize,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ClassProfile {
    /// IOKit registry vocabulary.
    pub fn darwin() -> Self {
        Self {
            processor_classes: strings(&["AppleACPICPU"]),
            battery_classes: strings(&["AppleSmartBattery"]),
            optical_classes: strings(&["IOCDMedia", "IODVDMedia", "IOBDMedia"]),
            block_name_key: keys::BSD_NAME.to_string(),
            block_prefixes: strings(&["disk"]),
            characteristics_depth: 2,
        }
    }

    /// Vocabulary produced by the UDisks2 backend.
    pub fn linux() -> Self {
        Self {
            processor_classes: strings(&["cpu"]),
            battery_classes: strings(&["battery"]),
            optical_classes: strings(&["optical_media"]),
            block_name_key: keys::BSD_NAME.to_string(),
            block_prefixes: strings(&["sd", "hd", "vd", "xvd", "nvme", "mmcblk", "sr", "loop"]),
            characteristics_depth: 1,
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "darwin" => Some(Self::darwin()),
            "linux" => Some(Self::linux()),
            _ => None,
        }
    }

    pub fn is_block_name(&self, name: &str) -> bool {
        self.block_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

impl Default for ClassProfile {
    fn default() -> Self {
        Self::darwin()
    }
}
