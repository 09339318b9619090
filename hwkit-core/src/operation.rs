// SPDX-License-Identifier: GPL-3.0-only

//! Shared plumbing for mount, unmount and eject requests.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use hwkit_contracts::{DeviceEvent, HwError, OperationKind, OperationOutcome};

use crate::device::DeviceNode;

pub(crate) fn kind_label(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Setup => "mount",
        OperationKind::Teardown => "unmount",
        OperationKind::Eject => "eject",
    }
}

/// Await `op`, giving up with `Timeout` once `deadline` passes.
pub(crate) async fn bounded<T>(
    deadline: Duration,
    what: &str,
    op: impl Future<Output = Result<T, HwError>>,
) -> Result<T, HwError> {
    match tokio::time::timeout(deadline, op).await {
        Ok(result) => result,
        Err(_) => Err(HwError::timeout(format!(
            "{what} did not complete within {}s",
            deadline.as_secs()
        ))),
    }
}

pub(crate) fn busy(device: &DeviceNode) -> HwError {
    HwError::rejected(format!(
        "another operation is already in progress on {}",
        device.udi()
    ))
}

/// Log and broadcast the terminal state of one request.
pub(crate) fn report_outcome(device: &DeviceNode, kind: OperationKind, result: Result<(), HwError>) {
    match &result {
        Ok(()) => info!("{} of {} succeeded", kind_label(kind), device.udi()),
        Err(e) => warn!("{} of {} failed: {e}", kind_label(kind), device.udi()),
    }

    device.emit(DeviceEvent::OperationDone(OperationOutcome {
        udi: device.udi().to_string(),
        kind,
        result,
    }));
}
