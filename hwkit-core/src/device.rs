// SPDX-License-Identifier: GPL-3.0-only

//! A classified registry entry and its lazily materialized ancestry.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use hwkit_contracts::{DeviceEvent, HwError, RegistryEntry};
use hwkit_types::{DeviceInterfaceType, HostInfo, PropertyMap, PropertyValue, TypeSet};

use crate::backend::Backend;
use crate::capability::{Battery, Processor, StorageDrive, StorageVolume};
use crate::classify::classify;

const EVENT_CAPACITY: usize = 32;

/// Ancestry walks stop after this many hops even if the registry loops.
pub(crate) const MAX_ANCESTRY: usize = 64;

pub const DEFAULT_ICON: &str = "drive-harddisk";
const DEFAULT_DESCRIPTION: &str = "Device";

/// Cached keys readable through [`DeviceNode::property`].
pub const MOUNT_POINT_KEY: &str = "mountPoint";
pub const IS_MOUNTED_KEY: &str = "isMounted";
pub const IS_IGNORED_KEY: &str = "isIgnored";

/// The only per-device state that changes after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AccessCache {
    pub mount_path: Option<String>,
    pub is_mounted: Option<bool>,
    pub is_ignored: Option<bool>,
}

pub struct DeviceNode {
    backend: Arc<Backend>,
    udi: String,
    parent_udi: String,
    class_name: String,
    properties: PropertyMap,
    types: TypeSet,
    main_type: DeviceInterfaceType,
    valid: bool,
    parent: OnceLock<Option<Box<DeviceNode>>>,
    cache: Mutex<AccessCache>,
    busy: AtomicBool,
    events: broadcast::Sender<DeviceEvent>,
}

/// Marks a device as having a mount, unmount or eject in flight.
pub(crate) struct OperationGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl DeviceNode {
    /// Look `udi` up in the registry and classify it.
    ///
    /// An empty or unknown UDI yields an inert node: no properties, type set
    /// `{Unknown}`, no parent.
    pub fn from_udi(backend: Arc<Backend>, udi: &str) -> Self {
        if udi.is_empty() {
            warn!("Cannot create a device from an empty udi");
            return Self::inert(backend, udi);
        }

        match backend.registry().entry(udi) {
            Some(entry) => Self::from_entry(backend, entry),
            None => {
                warn!("No registry entry for {udi}");
                Self::inert(backend, udi)
            }
        }
    }

    /// Classify an entry handed out by the registry. The entry is released
    /// when this returns.
    ///
    /// An entry whose properties cannot be read yields an inert node.
    pub fn from_entry(backend: Arc<Backend>, entry: Box<dyn RegistryEntry>) -> Self {
        let udi = entry.udi().to_string();
        Self::try_from_entry(backend.clone(), entry).unwrap_or_else(|e| {
            warn!("Failed to read properties of {udi}: {e}");
            Self::inert(backend, &udi)
        })
    }

    /// Like [`DeviceNode::from_entry`], but a failed property read is
    /// returned to the caller.
    pub fn try_from_entry(
        backend: Arc<Backend>,
        entry: Box<dyn RegistryEntry>,
    ) -> Result<Self, HwError> {
        if entry.udi().is_empty() {
            warn!(class = entry.class_name(), "Registry entry has no path");
            return Ok(Self::inert(backend, ""));
        }

        let properties = entry.properties()?;
        let classification = classify(|class| entry.conforms_to(class), &properties, backend.profile());
        debug!(
            udi = entry.udi(),
            types = ?classification.types,
            main = %classification.main_type,
            "Classified device"
        );

        Ok(Self::build(
            backend,
            entry.udi().to_string(),
            entry.parent_udi().to_string(),
            entry.class_name().to_string(),
            properties,
            classification.types,
            classification.main_type,
            true,
        ))
    }

    fn inert(backend: Arc<Backend>, udi: &str) -> Self {
        Self::build(
            backend,
            udi.to_string(),
            String::new(),
            String::new(),
            PropertyMap::new(),
            TypeSet::from(DeviceInterfaceType::Unknown),
            DeviceInterfaceType::Unknown,
            false,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        backend: Arc<Backend>,
        udi: String,
        parent_udi: String,
        class_name: String,
        properties: PropertyMap,
        types: TypeSet,
        main_type: DeviceInterfaceType,
        valid: bool,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            udi,
            parent_udi,
            class_name,
            properties,
            types,
            main_type,
            valid,
            parent: OnceLock::new(),
            cache: Mutex::new(AccessCache::default()),
            busy: AtomicBool::new(false),
            events,
        }
    }

    pub fn udi(&self) -> &str {
        &self.udi
    }

    pub fn parent_udi(&self) -> &str {
        &self.parent_udi
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn device_types(&self) -> TypeSet {
        self.types
    }

    pub fn main_type(&self) -> DeviceInterfaceType {
        self.main_type
    }

    /// False for nodes built from an empty or unknown UDI.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_root(&self) -> bool {
        self.valid && self.parent_udi.is_empty()
    }

    pub(crate) fn backend(&self) -> &Backend {
        &self.backend
    }

    pub(crate) fn host(&self) -> HostInfo {
        self.backend.session().host()
    }

    /// Registry property, falling back to the cached mount state.
    pub fn property(&self, key: &str) -> Option<PropertyValue> {
        if let Some(value) = self.properties.get(key) {
            return Some(value.clone());
        }

        let cache = self.access_cache();
        match key {
            MOUNT_POINT_KEY => cache.mount_path.clone().map(PropertyValue::String),
            IS_MOUNTED_KEY => cache.is_mounted.map(PropertyValue::Bool),
            IS_IGNORED_KEY => cache.is_ignored.map(PropertyValue::Bool),
            _ => None,
        }
    }

    pub fn property_exists(&self, key: &str) -> bool {
        self.property(key).is_some()
    }

    /// The parent device, built on first access and owned by this node.
    pub fn parent(&self) -> Option<&DeviceNode> {
        if self.parent_udi.is_empty() {
            return None;
        }

        self.parent
            .get_or_init(|| {
                let parent = DeviceNode::from_udi(self.backend.clone(), &self.parent_udi);
                parent.is_valid().then(|| Box::new(parent))
            })
            .as_deref()
    }

    /// Parent, grandparent, and so on up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &DeviceNode> {
        std::iter::successors(self.parent(), |node| node.parent()).take(MAX_ANCESTRY)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: DeviceEvent) {
        // No receivers is not an error.
        self.events.send(event).ok();
    }

    pub(crate) fn access_cache(&self) -> MutexGuard<'_, AccessCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn begin_operation(&self) -> Option<OperationGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| OperationGuard { busy: &self.busy })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn icon(&self) -> String {
        if self.is_root() {
            let host = self.host();
            let laptop = host.portable || host.model.contains("MacBook");
            return if laptop { "computer-laptop" } else { "computer" }.to_string();
        }

        match self.main_type {
            DeviceInterfaceType::Processor => "cpu".to_string(),
            DeviceInterfaceType::Battery => "battery".to_string(),
            DeviceInterfaceType::OpticalDrive => "drive-optical".to_string(),
            DeviceInterfaceType::StorageDrive => StorageDrive::new(self).icon(),
            DeviceInterfaceType::StorageVolume => StorageVolume::new(self).icon(),
            _ => self.inherited(DeviceNode::icon, DEFAULT_ICON),
        }
    }

    pub fn vendor(&self) -> String {
        if self.is_root() {
            let vendor = self.host().vendor;
            return if vendor.is_empty() { "Unknown".to_string() } else { vendor };
        }

        match self.main_type {
            DeviceInterfaceType::Processor => Processor::new(self).vendor(),
            DeviceInterfaceType::Battery => Battery::new(self).vendor(),
            DeviceInterfaceType::StorageDrive | DeviceInterfaceType::OpticalDrive => {
                StorageDrive::new(self).vendor()
            }
            DeviceInterfaceType::StorageVolume => StorageVolume::new(self).vendor(),
            _ => self.inherited(DeviceNode::vendor, ""),
        }
    }

    pub fn product(&self) -> String {
        if self.is_root() {
            let model = self.host().model;
            return if model.is_empty() { "Computer".to_string() } else { model };
        }

        match self.main_type {
            DeviceInterfaceType::Processor => Processor::new(self).product(),
            DeviceInterfaceType::Battery => Battery::new(self).product(),
            DeviceInterfaceType::StorageDrive | DeviceInterfaceType::OpticalDrive => {
                StorageDrive::new(self).product()
            }
            DeviceInterfaceType::StorageVolume => StorageVolume::new(self).product(),
            _ => self.inherited(DeviceNode::product, ""),
        }
    }

    pub fn description(&self) -> String {
        if self.is_root() {
            return self.product();
        }

        match self.main_type {
            DeviceInterfaceType::Processor => Processor::new(self).description(),
            DeviceInterfaceType::Battery => Battery::new(self).description(),
            DeviceInterfaceType::StorageDrive | DeviceInterfaceType::OpticalDrive => {
                StorageDrive::new(self).description()
            }
            DeviceInterfaceType::StorageVolume => StorageVolume::new(self).description(),
            _ => self.inherited(DeviceNode::description, DEFAULT_DESCRIPTION),
        }
    }

    pub fn emblems(&self) -> Vec<String> {
        let Some(access) = self.as_storage_access() else {
            return Vec::new();
        };

        match access.is_accessible() {
            Ok(true) => vec!["emblem-mounted".to_string()],
            Ok(false) => vec!["emblem-unmounted".to_string()],
            Err(e) => {
                debug!("No emblem for {}: {e}", self.udi);
                Vec::new()
            }
        }
    }

    /// Resolve a display value from the nearest ancestor that has one.
    fn inherited(&self, resolve: fn(&DeviceNode) -> String, fallback: &str) -> String {
        self.ancestors()
            .find(|node| node.is_root() || node.main_type != DeviceInterfaceType::Unknown)
            .map(resolve)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl fmt::Debug for DeviceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceNode")
            .field("udi", &self.udi)
            .field("parent_udi", &self.parent_udi)
            .field("class_name", &self.class_name)
            .field("types", &self.types)
            .field("main_type", &self.main_type)
            .field("valid", &self.valid)
            .finish_non_exhaustive()
    }
}
