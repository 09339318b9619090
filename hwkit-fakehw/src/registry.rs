// SPDX-License-Identifier: GPL-3.0-only

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use hwkit_contracts::{HwError, RegistryEntry, RegistryEvent, RegistryWalker};
use hwkit_types::PropertyMap;

use crate::fixture::FakeDevice;

#[derive(Debug, Default)]
struct EntryCounters {
    live: AtomicUsize,
    released: AtomicUsize,
}

/// Registry over a list of fake devices.
///
/// Tracks how many entries are outstanding so tests can check that every
/// entry handed out is released exactly once.
#[derive(Debug, Default)]
pub struct FakeRegistry {
    devices: RwLock<Vec<FakeDevice>>,
    counters: Arc<EntryCounters>,
    fail_enumerate: AtomicBool,
    unreadable: RwLock<HashSet<String>>,
}

struct FakeEntry {
    device: FakeDevice,
    counters: Arc<EntryCounters>,
    unreadable: bool,
}

impl Drop for FakeEntry {
    fn drop(&mut self) {
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl RegistryEntry for FakeEntry {
    fn udi(&self) -> &str {
        &self.device.udi
    }

    fn parent_udi(&self) -> &str {
        &self.device.parent
    }

    fn class_name(&self) -> &str {
        self.device
            .classes
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }

    fn conforms_to(&self, class: &str) -> bool {
        self.device.classes.iter().any(|c| c == class)
    }

    fn properties(&self) -> Result<PropertyMap, HwError> {
        if self.unreadable {
            return Err(HwError::transport(format!(
                "cannot read properties of {}",
                self.device.udi
            )));
        }
        Ok(self.device.properties.clone())
    }
}

impl FakeRegistry {
    pub fn new(devices: Vec<FakeDevice>) -> Self {
        Self {
            devices: RwLock::new(devices),
            ..Self::default()
        }
    }

    fn hand_out(&self, device: FakeDevice) -> Box<dyn RegistryEntry> {
        self.counters.live.fetch_add(1, Ordering::SeqCst);
        let unreadable = self
            .unreadable
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&device.udi);
        Box::new(FakeEntry {
            device,
            counters: self.counters.clone(),
            unreadable,
        })
    }

    /// Entries handed out and not yet dropped.
    pub fn live_entries(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    pub fn released_entries(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    /// Make `enumerate` fail like a broken registry connection.
    pub fn fail_enumeration(&self, fail: bool) {
        self.fail_enumerate.store(fail, Ordering::SeqCst);
    }

    /// Make `properties()` fail for entries of `udi`.
    pub fn fail_properties(&self, udi: &str, fail: bool) {
        let mut unreadable = self.unreadable.write().unwrap_or_else(PoisonError::into_inner);
        if fail {
            unreadable.insert(udi.to_string());
        } else {
            unreadable.remove(udi);
        }
    }

    pub fn add(&self, device: FakeDevice) -> RegistryEvent {
        let udi = device.udi.clone();
        debug!("Fake registry: adding {udi}");
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(device);
        RegistryEvent::Added(udi)
    }

    pub fn remove(&self, udi: &str) -> Option<RegistryEvent> {
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        let index = devices.iter().position(|d| d.udi == udi)?;
        devices.remove(index);
        debug!("Fake registry: removed {udi}");
        Some(RegistryEvent::Removed(udi.to_string()))
    }
}

impl RegistryWalker for FakeRegistry {
    fn enumerate(&self) -> Result<Vec<Box<dyn RegistryEntry>>, HwError> {
        if self.fail_enumerate.load(Ordering::SeqCst) {
            return Err(HwError::transport("fake registry is unavailable"));
        }

        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        Ok(devices.iter().cloned().map(|d| self.hand_out(d)).collect())
    }

    fn entry(&self, udi: &str) -> Option<Box<dyn RegistryEntry>> {
        if udi.is_empty() {
            return None;
        }

        let device = self
            .devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|d| d.udi == udi)
            .cloned()?;
        Some(self.hand_out(device))
    }
}
