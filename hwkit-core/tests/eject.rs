// SPDX-License-Identifier: GPL-3.0-only

mod common;

use std::time::Duration;

use common::*;
use hwkit_core::contracts::{
    DeviceEvent, HwError, HwErrorKind, NativeSession, OperationKind, OperationOutcome,
};
use hwkit_core::{EjectCoordinator, EjectState, Settings};
use hwkit_fakehw::{Behavior, Call, FakeOperation};

fn eject_outcomes(events: Vec<DeviceEvent>) -> Vec<Result<(), HwError>> {
    events
        .into_iter()
        .filter_map(|event| match event {
            DeviceEvent::OperationDone(OperationOutcome {
                kind: OperationKind::Eject,
                result,
                ..
            }) => Some(result),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn mounted_medium_is_unmounted_then_ejected() {
    let (hw, backend) = macbook();
    let disk3 = node(&backend, DISK3);
    let mut events = disk3.subscribe();
    let drive = disk3.as_optical_drive().expect("optical drive");

    drive.eject().await.expect("eject");

    assert_eq!(
        hw.session.take_calls(),
        vec![
            Call::Unmount {
                disk: "disk3".to_string(),
                whole: true
            },
            Call::Eject("disk3".to_string()),
        ]
    );
    assert!(hw.session.is_ejected("disk3"));
    assert_eq!(eject_outcomes(drain(&mut events)), vec![Ok(())]);
}

#[tokio::test]
async fn unmounted_medium_is_ejected_directly() {
    let (hw, backend) = macbook();
    hw.session.set_mount_path("disk3", None);
    let disk3 = node(&backend, DISK3);
    let drive = disk3.as_optical_drive().expect("optical drive");

    drive.eject().await.expect("eject");
    assert_eq!(
        hw.session.take_calls(),
        vec![Call::Eject("disk3".to_string())]
    );
}

#[tokio::test]
async fn refused_unmount_fails_without_ejecting() {
    let (hw, backend) = macbook();
    hw.session.set_behavior(
        "disk3",
        FakeOperation::Unmount,
        Behavior::Fail(HwError::rejected("target is busy")),
    );
    let disk3 = node(&backend, DISK3);
    let mut events = disk3.subscribe();
    let drive = disk3.as_optical_drive().expect("optical drive");

    let err = drive.eject().await.expect_err("unmount refused");
    assert_eq!(err.kind, HwErrorKind::OperationRejected);
    assert!(!hw.session.is_ejected("disk3"));
    assert!(
        !hw.session
            .take_calls()
            .contains(&Call::Eject("disk3".to_string()))
    );
    assert_eq!(
        eject_outcomes(drain(&mut events)),
        vec![Err(HwError::rejected("target is busy"))]
    );
}

#[tokio::test(start_paused = true)]
async fn silent_eject_times_out_once() {
    let (hw, backend) = macbook_with(Settings {
        operation_timeout_secs: 10,
        ..Settings::default()
    });
    hw.session
        .set_behavior("disk3", FakeOperation::Eject, Behavior::Hang);
    let disk3 = node(&backend, DISK3);
    let mut events = disk3.subscribe();
    let drive = disk3.as_optical_drive().expect("optical drive");

    let err = drive.eject().await.expect_err("eject never answers");
    assert_eq!(err.kind, HwErrorKind::Timeout);

    let outcomes = eject_outcomes(drain(&mut events));
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(&outcomes[0], Err(e) if e.kind == HwErrorKind::Timeout));
    assert!(!disk3.is_busy());
}

#[tokio::test(start_paused = true)]
async fn overlapping_ejects_are_rejected() {
    let (hw, backend) = macbook_with(Settings {
        operation_timeout_secs: 10,
        ..Settings::default()
    });
    hw.session
        .set_behavior("disk3", FakeOperation::Eject, Behavior::Hang);
    let disk3 = node(&backend, DISK3);
    let mut events = disk3.subscribe();
    let first = disk3.as_optical_drive().expect("optical drive");
    let second = disk3.as_optical_drive().expect("optical drive");

    let (a, b) = tokio::join!(first.eject(), second.eject());
    assert_eq!(a.expect_err("hangs").kind, HwErrorKind::Timeout);
    assert_eq!(b.expect_err("busy").kind, HwErrorKind::OperationRejected);

    let outcomes = eject_outcomes(drain(&mut events));
    assert_eq!(outcomes.len(), 2);
    assert_eq!(
        hw.session
            .take_calls()
            .iter()
            .filter(|c| matches!(c, Call::Eject(_)))
            .count(),
        1
    );
}

#[tokio::test]
async fn coordinator_walks_through_its_states() {
    let (hw, backend) = macbook();
    let disk3 = node(&backend, DISK3);
    let disk = hw.session.open_disk("disk3").expect("disk3");

    let coordinator = EjectCoordinator::new(&disk3, Some(disk.as_ref()), Duration::from_secs(5));
    assert_eq!(coordinator.state(), EjectState::Idle);
    coordinator.run().await.expect("eject");
    assert_eq!(coordinator.state(), EjectState::Completed(Ok(())));
}

#[tokio::test(start_paused = true)]
async fn coordinator_records_timeout() {
    let (hw, backend) = macbook();
    hw.session
        .set_behavior("disk3", FakeOperation::Unmount, Behavior::Hang);
    let disk3 = node(&backend, DISK3);
    let disk = hw.session.open_disk("disk3").expect("disk3");

    let coordinator = EjectCoordinator::new(&disk3, Some(disk.as_ref()), Duration::from_secs(3));
    coordinator.run().await.expect_err("unmount hangs");
    assert_eq!(coordinator.state(), EjectState::TimedOut);
    assert!(!hw.session.is_ejected("disk3"));
}

#[tokio::test]
async fn coordinator_without_disk_fails() {
    let (_hw, backend) = macbook();
    let disk3 = node(&backend, DISK3);
    let mut events = disk3.subscribe();

    let coordinator = EjectCoordinator::new(&disk3, None, Duration::from_secs(5));
    let err = coordinator.run().await.expect_err("no disk");
    assert_eq!(err.kind, HwErrorKind::TransportFailure);
    assert_eq!(eject_outcomes(drain(&mut events)).len(), 1);
}
