// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HwErrorKind {
    /// Unknown or stale UDI.
    NotFound,
    /// The device does not support the requested capability.
    UnsupportedCapability,
    /// A native registry or session call failed.
    TransportFailure,
    /// The native volume manager (or an in-flight guard) refused the operation.
    OperationRejected,
    /// A bounded wait expired.
    Timeout,
    /// Malformed caller input such as a predicate string.
    InvalidInput,
}

impl HwErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::UnsupportedCapability => "UnsupportedCapability",
            Self::TransportFailure => "TransportFailure",
            Self::OperationRejected => "OperationRejected",
            Self::Timeout => "Timeout",
            Self::InvalidInput => "InvalidInput",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct HwError {
    pub kind: HwErrorKind,
    pub message: String,
}

impl HwError {
    pub fn new(kind: HwErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(udi: &str) -> Self {
        Self::new(HwErrorKind::NotFound, format!("no device with udi {udi}"))
    }

    pub fn unsupported(udi: &str, capability: &str) -> Self {
        Self::new(
            HwErrorKind::UnsupportedCapability,
            format!("{udi} does not support {capability}"),
        )
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(HwErrorKind::TransportFailure, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(HwErrorKind::OperationRejected, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(HwErrorKind::Timeout, message)
    }
}

pub type Result<T> = std::result::Result<T, HwError>;
