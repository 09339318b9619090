// SPDX-License-Identifier: GPL-3.0-only

use std::sync::{PoisonError, RwLock};

use hwkit_contracts::{HwError, RegistryEntry, RegistryWalker};
use hwkit_types::PropertyMap;

use crate::records::Record;

/// Snapshot of the records produced by the last refresh.
#[derive(Debug, Default)]
pub struct UdisksRegistry {
    records: RwLock<Vec<Record>>,
}

struct UdisksEntry(Record);

impl RegistryEntry for UdisksEntry {
    fn udi(&self) -> &str {
        &self.0.udi
    }

    fn parent_udi(&self) -> &str {
        &self.0.parent
    }

    fn class_name(&self) -> &str {
        self.0.classes.first().map(String::as_str).unwrap_or_default()
    }

    fn conforms_to(&self, class: &str) -> bool {
        self.0.classes.iter().any(|c| c == class)
    }

    fn properties(&self) -> Result<PropertyMap, HwError> {
        Ok(self.0.properties.clone())
    }
}

impl UdisksRegistry {
    /// Swap in a new snapshot, returning the UDIs that (appeared, disappeared).
    pub fn replace(&self, records: Vec<Record>) -> (Vec<String>, Vec<String>) {
        let mut current = self.records.write().unwrap_or_else(PoisonError::into_inner);

        let added = records
            .iter()
            .filter(|r| !current.iter().any(|c| c.udi == r.udi))
            .map(|r| r.udi.clone())
            .collect();
        let removed = current
            .iter()
            .filter(|c| !records.iter().any(|r| r.udi == c.udi))
            .map(|c| c.udi.clone())
            .collect();

        *current = records;
        (added, removed)
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RegistryWalker for UdisksRegistry {
    fn enumerate(&self) -> Result<Vec<Box<dyn RegistryEntry>>, HwError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records
            .iter()
            .cloned()
            .map(|r| Box::new(UdisksEntry(r)) as Box<dyn RegistryEntry>)
            .collect())
    }

    fn entry(&self, udi: &str) -> Option<Box<dyn RegistryEntry>> {
        if udi.is_empty() {
            return None;
        }
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|r| r.udi == udi)
            .cloned()
            .map(|r| Box::new(UdisksEntry(r)) as Box<dyn RegistryEntry>)
    }
}
