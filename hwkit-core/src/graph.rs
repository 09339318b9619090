// SPDX-License-Identifier: GPL-3.0-only

//! The set of devices a backend currently exposes.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use hwkit_contracts::{HwError, RegistryEvent};

use crate::backend::Backend;
use crate::device::{DeviceNode, MAX_ANCESTRY};
use crate::predicate::Predicate;
use crate::report::DeviceReport;

const EVENT_CAPACITY: usize = 64;

/// Operations `invoke_volume_call` can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeCall {
    Mount,
    Unmount,
    Eject,
}

pub struct DeviceGraph {
    backend: Arc<Backend>,
    devices: RwLock<BTreeMap<String, Arc<DeviceNode>>>,
    events: broadcast::Sender<RegistryEvent>,
}

impl DeviceGraph {
    pub fn new(backend: Arc<Backend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            devices: RwLock::new(BTreeMap::new()),
            events,
        }
    }

    /// Build a graph and populate it from the registry.
    pub fn load(backend: Arc<Backend>) -> Result<Self, HwError> {
        let graph = Self::new(backend);
        graph.refresh()?;
        Ok(graph)
    }

    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }

    /// Re-enumerate the registry.
    ///
    /// Devices that are still present keep their node (and with it their
    /// cached mount state); new and vanished devices are announced. A device
    /// whose properties cannot be read fails the refresh and leaves the graph
    /// untouched.
    pub fn refresh(&self) -> Result<(), HwError> {
        let entries = self.backend.registry().enumerate()?;
        let mut fresh = BTreeMap::new();
        {
            let current = self.devices.read().unwrap_or_else(PoisonError::into_inner);
            for entry in entries {
                if entry.udi().is_empty() {
                    debug!(class = entry.class_name(), "Skipping registry entry without a path");
                    continue;
                }
                let node = match current.get(entry.udi()) {
                    Some(existing) => existing.clone(),
                    None => Arc::new(DeviceNode::try_from_entry(self.backend.clone(), entry)?),
                };
                fresh.insert(node.udi().to_string(), node);
            }
        }

        let previous = {
            let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *devices, fresh)
        };

        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        for udi in previous.keys().filter(|udi| !devices.contains_key(*udi)) {
            self.announce(RegistryEvent::Removed(udi.clone()));
        }
        for udi in devices.keys().filter(|udi| !previous.contains_key(*udi)) {
            self.announce(RegistryEvent::Added(udi.clone()));
        }

        info!("Device graph holds {} devices", devices.len());
        Ok(())
    }

    fn announce(&self, event: RegistryEvent) {
        debug!(?event, "Device graph changed");
        self.events.send(event).ok();
    }

    /// Apply one add or remove notification from the backend.
    pub fn apply(&self, event: &RegistryEvent) {
        match event {
            RegistryEvent::Added(udi) => {
                let node = DeviceNode::from_udi(self.backend.clone(), udi);
                if !node.is_valid() {
                    warn!("Ignoring addition of unknown device {udi}");
                    return;
                }
                let inserted = self
                    .devices
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(udi.clone(), Arc::new(node))
                    .is_none();
                if inserted {
                    self.announce(event.clone());
                }
            }
            RegistryEvent::Removed(udi) => {
                let removed = self
                    .devices
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(udi)
                    .is_some();
                if removed {
                    self.announce(event.clone());
                }
            }
        }
    }

    /// Apply backend notifications until the stream ends.
    pub async fn follow<S>(&self, mut stream: S)
    where
        S: Stream<Item = RegistryEvent> + Unpin,
    {
        while let Some(event) = stream.next().await {
            self.apply(&event);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub fn udis(&self) -> Vec<String> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn device(&self, udi: &str) -> Option<Arc<DeviceNode>> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(udi)
            .cloned()
    }

    pub fn require(&self, udi: &str) -> Result<Arc<DeviceNode>, HwError> {
        self.device(udi).ok_or_else(|| HwError::not_found(udi))
    }

    pub fn describe(&self, udi: &str) -> Result<DeviceReport, HwError> {
        self.require(udi)?.report()
    }

    /// Whether `udi` is `scope` or one of its descendants.
    pub fn in_branch(&self, udi: &str, scope: &str) -> bool {
        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        let mut current = udi;
        for _ in 0..MAX_ANCESTRY {
            if current == scope {
                return true;
            }
            match devices.get(current) {
                Some(node) if !node.parent_udi().is_empty() => current = node.parent_udi(),
                _ => return false,
            }
        }
        false
    }

    /// UDIs of the devices matching `predicate`, optionally limited to the
    /// branch below `scope`.
    pub fn query(&self, predicate: &Predicate, scope: Option<&str>) -> Vec<String> {
        let candidates: Vec<Arc<DeviceNode>> = self
            .devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        candidates
            .into_iter()
            .filter(|node| scope.is_none_or(|scope| self.in_branch(node.udi(), scope)))
            .filter(|node| predicate.matches(node))
            .map(|node| node.udi().to_string())
            .collect()
    }

    /// Run a mount, unmount or eject and wait for its outcome.
    pub async fn invoke_volume_call(&self, call: VolumeCall, udi: &str) -> Result<(), HwError> {
        let device = self.require(udi)?;
        match call {
            VolumeCall::Mount => {
                let access = device
                    .as_storage_access()
                    .ok_or_else(|| HwError::unsupported(udi, "StorageAccess"))?;
                let path = access.mount().await?;
                info!("Mounted {udi} at {path}");
                Ok(())
            }
            VolumeCall::Unmount => {
                let access = device
                    .as_storage_access()
                    .ok_or_else(|| HwError::unsupported(udi, "StorageAccess"))?;
                access.unmount().await
            }
            VolumeCall::Eject => {
                let drive = device
                    .as_optical_drive()
                    .ok_or_else(|| HwError::unsupported(udi, "OpticalDrive"))?;
                drive.eject().await
            }
        }
    }
}
