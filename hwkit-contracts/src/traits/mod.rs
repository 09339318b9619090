// SPDX-License-Identifier: GPL-3.0-only

pub mod registry;
pub mod session;

pub use registry::{RegistryEntry, RegistryWalker};
pub use session::{DiskHandle, NativeSession};
