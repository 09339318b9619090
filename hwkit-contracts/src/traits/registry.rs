// SPDX-License-Identifier: GPL-3.0-only

use hwkit_types::PropertyMap;

use crate::HwError;

/// One native registry entry.
///
/// The native reference is released when the value is dropped, so every
/// entry handed out is released exactly once.
pub trait RegistryEntry: Send + Sync {
    /// Registry path of the entry; empty when the entry has no stable path.
    fn udi(&self) -> &str;

    /// Path of the entry's parent, or empty for the root.
    fn parent_udi(&self) -> &str;

    /// Concrete registry class name.
    fn class_name(&self) -> &str;

    /// Whether the entry's class is, or derives from, `class`.
    fn conforms_to(&self, class: &str) -> bool;

    /// Snapshot of the entry's properties.
    fn properties(&self) -> Result<PropertyMap, HwError>;
}

/// Walks a native hardware registry.
pub trait RegistryWalker: Send + Sync {
    /// Every entry the backend exposes, parents before children.
    fn enumerate(&self) -> Result<Vec<Box<dyn RegistryEntry>>, HwError>;

    /// Resolve a UDI. `None` for unknown or empty paths.
    fn entry(&self, udi: &str) -> Option<Box<dyn RegistryEntry>>;
}
