// SPDX-License-Identifier: GPL-3.0-only

//! Unmount-then-eject workflow for optical media.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use hwkit_contracts::{DiskHandle, HwError, HwErrorKind, OperationKind};
use hwkit_types::keys::description as da;

use crate::device::DeviceNode;
use crate::operation::{bounded, busy, report_outcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EjectState {
    Idle,
    Unmounting,
    Ejecting,
    Completed(Result<(), HwError>),
    TimedOut,
}

/// Drives one eject request to exactly one completion event.
pub struct EjectCoordinator<'a> {
    device: &'a DeviceNode,
    disk: Option<&'a dyn DiskHandle>,
    timeout: Duration,
    state: Mutex<EjectState>,
}

impl<'a> EjectCoordinator<'a> {
    pub fn new(device: &'a DeviceNode, disk: Option<&'a dyn DiskHandle>, timeout: Duration) -> Self {
        Self {
            device,
            disk,
            timeout,
            state: Mutex::new(EjectState::Idle),
        }
    }

    pub fn state(&self) -> EjectState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_state(&self, state: EjectState) {
        debug!(udi = self.device.udi(), ?state, "Eject state");
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Unmount the medium if it is mounted, then eject it.
    ///
    /// A refused unmount fails the request without ejecting. The whole
    /// sequence shares one deadline; running out of it yields `Timeout`.
    /// Overlapping requests on the same device are rejected.
    pub async fn run(&self) -> Result<(), HwError> {
        let result = match self.device.begin_operation() {
            Some(_guard) => match self.disk {
                Some(disk) => {
                    bounded(self.timeout, "eject", self.unmount_then_eject(disk)).await
                }
                None => Err(HwError::transport(format!(
                    "could not open a disk handle for {}",
                    self.device.udi()
                ))),
            },
            None => Err(busy(self.device)),
        };

        match &result {
            Err(e) if e.kind == HwErrorKind::Timeout => self.set_state(EjectState::TimedOut),
            _ => self.set_state(EjectState::Completed(result.clone())),
        }

        report_outcome(self.device, OperationKind::Eject, result.clone());
        result
    }

    async fn unmount_then_eject(&self, disk: &dyn DiskHandle) -> Result<(), HwError> {
        let description = disk.describe()?;
        let mounted = description
            .get_str(da::VOLUME_PATH)
            .is_some_and(|path| !path.is_empty());

        if mounted {
            self.set_state(EjectState::Unmounting);
            disk.unmount(true).await?;
        }

        self.set_state(EjectState::Ejecting);
        disk.eject().await
    }
}
