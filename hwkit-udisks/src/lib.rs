// SPDX-License-Identifier: GPL-3.0-only

//! Linux hardware backend.
//!
//! Storage comes from the UDisks2 object tree on the system bus,
//! processors and host identity from procfs, batteries from the
//! `power_supply` class in sysfs. Everything is flattened into registry
//! records so the classifier sees one tree rooted at `/org/freedesktop/UDisks2`.

pub mod bytestring;
pub mod error;
pub mod manager;
pub mod platform;
pub mod records;
pub mod registry;
pub mod session;

pub use manager::{RegistryEventStream, UdisksManager};
pub use records::{ROOT_UDI, Record};
pub use registry::UdisksRegistry;
pub use session::UdisksSession;
