// SPDX-License-Identifier: GPL-3.0-only

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use hwkit_contracts::{DiskHandle, HwError, NativeSession, PropertyChange};
use hwkit_types::keys::{self, description as da};
use hwkit_types::{HostInfo, PropertyMap, PropertyValue};

use crate::fixture::Fixture;

const PUSH_CAPACITY: usize = 16;

/// A call that reached the fake volume manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Mount(String),
    Unmount { disk: String, whole: bool },
    Eject(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOperation {
    Mount,
    Unmount,
    Eject,
}

/// How the fake volume manager answers one kind of request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail(HwError),
    /// Never answer.
    Hang,
}

#[derive(Debug, Clone)]
struct DiskState {
    udi: String,
    description: PropertyMap,
    mount_path: Option<String>,
    ejected: bool,
}

#[derive(Debug, Default)]
struct SessionState {
    disks: HashMap<String, DiskState>,
    behaviors: HashMap<(String, FakeOperation), Behavior>,
    calls: Vec<Call>,
    broken_descriptions: HashSet<String>,
    push_enabled: bool,
    push: HashMap<String, broadcast::Sender<PropertyChange>>,
}

impl SessionState {
    fn set_mount_path(&mut self, block: &str, mount_path: Option<String>) {
        let Some(disk) = self.disks.get_mut(block) else {
            return;
        };
        if disk.mount_path == mount_path {
            return;
        }
        disk.mount_path = mount_path.clone();

        let udi = disk.udi.clone();
        if let Some(sender) = self.push.get(&udi) {
            sender
                .send(PropertyChange {
                    udi,
                    key: da::VOLUME_PATH.to_string(),
                    value: mount_path.map(PropertyValue::String),
                })
                .ok();
        }
    }

    fn behavior(&self, block: &str, operation: FakeOperation) -> Behavior {
        self.behaviors
            .get(&(block.to_string(), operation))
            .cloned()
            .unwrap_or(Behavior::Succeed)
    }
}

/// Volume manager over fixture disks with programmable answers.
#[derive(Debug)]
pub struct FakeSession {
    host: HostInfo,
    state: Arc<Mutex<SessionState>>,
    open_handles: Arc<AtomicUsize>,
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeSession {
    pub fn from_fixture(fixture: &Fixture) -> Self {
        let mut disks = HashMap::new();
        for device in &fixture.devices {
            let Some(block) = device.properties.get_str(keys::BSD_NAME) else {
                continue;
            };
            let seed = device.disk.clone().unwrap_or_default();
            disks.insert(
                block.to_string(),
                DiskState {
                    udi: device.udi.clone(),
                    description: seed.description,
                    mount_path: seed.mount_path,
                    ejected: false,
                },
            );
        }

        Self {
            host: fixture.host.clone(),
            state: Arc::new(Mutex::new(SessionState {
                disks,
                ..SessionState::default()
            })),
            open_handles: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Offer a push channel for property changes.
    pub fn enable_push(&self) {
        lock(&self.state).push_enabled = true;
    }

    pub fn set_behavior(&self, block: &str, operation: FakeOperation, behavior: Behavior) {
        lock(&self.state)
            .behaviors
            .insert((block.to_string(), operation), behavior);
    }

    /// Mount or unmount behind the library's back.
    pub fn set_mount_path(&self, block: &str, mount_path: Option<&str>) {
        lock(&self.state).set_mount_path(block, mount_path.map(str::to_string));
    }

    pub fn mount_path(&self, block: &str) -> Option<String> {
        lock(&self.state)
            .disks
            .get(block)
            .and_then(|d| d.mount_path.clone())
    }

    pub fn is_ejected(&self, block: &str) -> bool {
        lock(&self.state).disks.get(block).is_some_and(|d| d.ejected)
    }

    /// Make `describe` fail for `block`.
    pub fn break_description(&self, block: &str) {
        lock(&self.state)
            .broken_descriptions
            .insert(block.to_string());
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut lock(&self.state).calls)
    }

    /// Disk handles currently open.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }
}

impl NativeSession for FakeSession {
    fn open_disk(&self, block_name: &str) -> Option<Box<dyn DiskHandle>> {
        if !lock(&self.state).disks.contains_key(block_name) {
            return None;
        }

        self.open_handles.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(FakeDiskHandle {
            block: block_name.to_string(),
            state: self.state.clone(),
            open_handles: self.open_handles.clone(),
        }))
    }

    fn subscribe(&self, udi: &str) -> Option<broadcast::Receiver<PropertyChange>> {
        let mut state = lock(&self.state);
        if !state.push_enabled {
            return None;
        }
        let sender = state
            .push
            .entry(udi.to_string())
            .or_insert_with(|| broadcast::channel(PUSH_CAPACITY).0);
        Some(sender.subscribe())
    }

    fn host(&self) -> HostInfo {
        self.host.clone()
    }
}

struct FakeDiskHandle {
    block: String,
    state: Arc<Mutex<SessionState>>,
    open_handles: Arc<AtomicUsize>,
}

impl Drop for FakeDiskHandle {
    fn drop(&mut self) {
        self.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeDiskHandle {
    /// Record the call and look up the scripted answer.
    async fn answer(&self, call: Call, operation: FakeOperation) -> Result<(), HwError> {
        let behavior = {
            let mut state = lock(&self.state);
            state.calls.push(call);
            state.behavior(&self.block, operation)
        };

        match behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(e) => Err(e),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl DiskHandle for FakeDiskHandle {
    fn block_name(&self) -> &str {
        &self.block
    }

    fn describe(&self) -> Result<PropertyMap, HwError> {
        let state = lock(&self.state);
        if state.broken_descriptions.contains(&self.block) {
            return Err(HwError::transport(format!(
                "could not describe {}",
                self.block
            )));
        }

        let disk = state
            .disks
            .get(&self.block)
            .ok_or_else(|| HwError::transport(format!("{} is gone", self.block)))?;
        let mut description = disk.description.clone();
        if let Some(path) = &disk.mount_path {
            description.insert(da::VOLUME_PATH, path.as_str());
        }
        Ok(description)
    }

    async fn mount(&self) -> Result<String, HwError> {
        self.answer(Call::Mount(self.block.clone()), FakeOperation::Mount)
            .await?;

        let mut state = lock(&self.state);
        let disk = state
            .disks
            .get(&self.block)
            .ok_or_else(|| HwError::transport(format!("{} is gone", self.block)))?;
        if disk.mount_path.is_some() {
            return Err(HwError::rejected(format!("{} is already mounted", self.block)));
        }

        let name = disk
            .description
            .get_str(da::VOLUME_NAME)
            .unwrap_or(self.block.as_str())
            .to_string();
        let path = format!("/Volumes/{name}");
        debug!("Fake session: mounted {} at {path}", self.block);
        state.set_mount_path(&self.block, Some(path.clone()));
        Ok(path)
    }

    async fn unmount(&self, whole: bool) -> Result<(), HwError> {
        self.answer(
            Call::Unmount {
                disk: self.block.clone(),
                whole,
            },
            FakeOperation::Unmount,
        )
        .await?;

        let mut state = lock(&self.state);
        let targets: Vec<String> = state
            .disks
            .iter()
            .filter(|(block, disk)| {
                disk.mount_path.is_some()
                    && if whole {
                        block.starts_with(self.block.as_str())
                    } else {
                        **block == self.block
                    }
            })
            .map(|(block, _)| block.clone())
            .collect();

        if targets.is_empty() && !whole {
            return Err(HwError::rejected(format!("{} is not mounted", self.block)));
        }
        for block in targets {
            state.set_mount_path(&block, None);
        }
        Ok(())
    }

    async fn eject(&self) -> Result<(), HwError> {
        self.answer(Call::Eject(self.block.clone()), FakeOperation::Eject)
            .await?;

        let mut state = lock(&self.state);
        let busy = state
            .disks
            .iter()
            .any(|(block, disk)| block.starts_with(self.block.as_str()) && disk.mount_path.is_some());
        if busy {
            return Err(HwError::rejected(format!(
                "{} has mounted volumes",
                self.block
            )));
        }

        if let Some(disk) = state.disks.get_mut(&self.block) {
            disk.ejected = true;
        }
        Ok(())
    }
}
