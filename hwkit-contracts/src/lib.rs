// SPDX-License-Identifier: GPL-3.0-only

pub mod error;
pub mod event;
pub mod traits;

pub use error::{HwError, HwErrorKind, Result};
pub use event::{DeviceEvent, OperationKind, OperationOutcome, PropertyChange, RegistryEvent};
pub use traits::{DiskHandle, NativeSession, RegistryEntry, RegistryWalker};
