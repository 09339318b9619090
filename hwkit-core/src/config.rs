// SPDX-License-Identifier: GPL-3.0-only

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CHARACTERISTICS_SEARCH_DEPTH: usize = 4;

/// Tunables shared by every device of a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Upper bound for a mount, unmount or eject round trip.
    pub operation_timeout_secs: u64,

    /// How many ancestors an optical drive searches for `Device Characteristics`.
    pub characteristics_search_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
            characteristics_search_depth: DEFAULT_CHARACTERISTICS_SEARCH_DEPTH,
        }
    }
}

impl Settings {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}
