// SPDX-License-Identifier: GPL-3.0-only

//! Device classification and capability model.
//!
//! Registry entries are classified into [`DeviceNode`]s; callers ask a node
//! for typed capability views ([`StorageAccess`], [`OpticalDrive`], ...)
//! which are created on demand and never cached. Mount, unmount and eject
//! are the only asynchronous operations and each reports exactly one
//! [`hwkit_contracts::DeviceEvent::OperationDone`].

pub mod backend;
pub mod capability;
pub mod classify;
pub mod config;
pub mod device;
pub mod eject;
pub mod factory;
pub mod graph;
mod operation;
pub mod predicate;
pub mod profile;
pub mod report;

pub use backend::Backend;
pub use capability::{
    Battery, Block, GenericInterface, OpticalDrive, Processor, StorageAccess, StorageDrive,
    StorageVolume, media_from_features,
};
pub use classify::{Classification, classify};
pub use config::Settings;
pub use device::DeviceNode;
pub use eject::{EjectCoordinator, EjectState};
pub use factory::{DeviceInterface, create, supports};
pub use graph::{DeviceGraph, VolumeCall};
pub use predicate::{Predicate, PredicateError};
pub use profile::ClassProfile;
pub use report::{DeviceReport, InterfaceReport};

pub use hwkit_contracts as contracts;
pub use hwkit_types as types;
