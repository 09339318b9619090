// SPDX-License-Identifier: GPL-3.0-only

//! Canonical data types for the hwkit hardware abstraction layer
//!
//! These types are shared by every layer:
//!
//! - **hwkit-core**: classifies registry entries and exposes capabilities in these terms
//! - **hwkit-fakehw** / **hwkit-udisks**: translate native data into `PropertyMap`s
//! - **hwkit-cli**: prints and serializes them

pub mod battery;
pub mod host;
pub mod interface;
pub mod keys;
pub mod processor;
pub mod property;
pub mod storage;

pub use battery::{BatteryType, ChargeState, Technology};
pub use host::HostInfo;
pub use interface::{DeviceInterfaceType, TypeSet};
pub use processor::{InstructionSet, InstructionSets, instruction_sets_from_features};
pub use property::{PropertyMap, PropertyValue};
pub use storage::{Bus, DriveType, MediumType, MediumTypes, VolumeUsage};
