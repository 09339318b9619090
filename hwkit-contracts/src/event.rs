// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

use crate::error::HwError;
use hwkit_types::PropertyValue;

/// Registry topology change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    Added(String),
    Removed(String),
}

/// Pushed property change for one device, delivered in transport order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub udi: String,
    pub key: String,
    /// `None` when the property disappeared.
    pub value: Option<PropertyValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Setup,
    Teardown,
    Eject,
}

/// Terminal state of one mount, unmount or eject request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub udi: String,
    pub kind: OperationKind,
    pub result: Result<(), HwError>,
}

/// Events emitted on a device's notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceEvent {
    AccessibilityChanged { udi: String, accessible: bool },
    OperationDone(OperationOutcome),
}
