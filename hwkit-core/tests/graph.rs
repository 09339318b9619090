// SPDX-License-Identifier: GPL-3.0-only

mod common;

use common::*;
use hwkit_core::contracts::{HwErrorKind, RegistryEvent};
use hwkit_core::types::{DeviceInterfaceType, PropertyMap};
use hwkit_core::{DeviceGraph, Predicate, VolumeCall};
use hwkit_fakehw::FakeDevice;

fn predicate(input: &str) -> Predicate {
    input.parse().expect("valid predicate")
}

fn drain_registry(
    receiver: &mut tokio::sync::broadcast::Receiver<RegistryEvent>,
) -> Vec<RegistryEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

fn spare_battery() -> FakeDevice {
    FakeDevice {
        udi: "IOService:/AppleSmartBattery2".to_string(),
        parent: ROOT.to_string(),
        classes: vec!["AppleSmartBattery".to_string()],
        properties: PropertyMap::new().with("Manufacturer", "DP"),
        disk: None,
    }
}

#[test]
fn load_enumerates_every_device() {
    let (hw, backend) = macbook();
    let graph = DeviceGraph::load(backend).expect("load");

    assert_eq!(graph.udis().len(), 14);
    assert!(graph.device(DISK3).is_some());
    assert_eq!(
        graph.require("IOService:/Nowhere").expect_err("unknown").kind,
        HwErrorKind::NotFound
    );
    assert_eq!(hw.registry.live_entries(), 0);
}

#[test]
fn enumeration_failure_is_reported() {
    let (hw, backend) = macbook();
    hw.registry.fail_enumeration(true);
    let err = DeviceGraph::load(backend).err().expect("enumeration fails");
    assert_eq!(err.kind, HwErrorKind::TransportFailure);
}

#[test]
fn unreadable_properties_fail_the_load() {
    let (hw, backend) = macbook();
    hw.registry.fail_properties(DISK2S1, true);

    let err = DeviceGraph::load(backend).err().expect("properties fail");
    assert_eq!(err.kind, HwErrorKind::TransportFailure);
    assert_eq!(hw.registry.live_entries(), 0);
}

#[test]
fn unreadable_new_device_leaves_the_graph_untouched() {
    let (hw, backend) = macbook();
    let graph = DeviceGraph::load(backend.clone()).expect("load");
    let mut events = graph.subscribe();

    let battery = spare_battery();
    let udi = battery.udi.clone();
    hw.registry.add(battery);
    hw.registry.fail_properties(&udi, true);

    assert_eq!(
        graph.refresh().expect_err("properties fail").kind,
        HwErrorKind::TransportFailure
    );
    assert!(graph.device(&udi).is_none());
    assert_eq!(graph.udis().len(), 14);
    assert!(drain_registry(&mut events).is_empty());

    graph.apply(&RegistryEvent::Added(udi.clone()));
    assert!(graph.device(&udi).is_none());
    assert!(!hwkit_core::DeviceNode::from_udi(backend, &udi).is_valid());

    hw.registry.fail_properties(&udi, false);
    graph.refresh().expect("refresh");
    assert!(graph.device(&udi).is_some());
}

#[test]
fn query_by_capability_and_property() {
    let (_hw, backend) = macbook();
    let graph = DeviceGraph::load(backend).expect("load");

    let mut volumes = graph.query(&predicate("IS StorageVolume"), None);
    volumes.sort();
    let mut expected = vec![DISK0S2.to_string(), DISK2S1.to_string(), DISK2S2.to_string()];
    expected.sort();
    assert_eq!(volumes, expected);

    assert_eq!(
        graph.query(
            &predicate("[ IS StorageVolume AND StorageVolume.fsType == 'msdos' ]"),
            None
        ),
        vec![DISK2S1.to_string()]
    );
    assert_eq!(
        graph.query(&predicate("OpticalDrive.supportedMedia & 'Dvdplusrw'"), None),
        vec![DISK3.to_string()]
    );
    assert_eq!(
        graph.query(&predicate("StorageVolume.ignored == true"), None),
        vec![DISK2S2.to_string()]
    );
    assert!(
        graph
            .query(&predicate("OpticalDrive.supportedMedia & 'Bd'"), None)
            .is_empty()
    );
}

#[test]
fn query_within_a_branch() {
    let (_hw, backend) = macbook();
    let graph = DeviceGraph::load(backend).expect("load");

    let mut found = graph.query(&predicate("IS StorageAccess"), Some(DISK2));
    found.sort();
    let mut expected = vec![DISK2.to_string(), DISK2S1.to_string(), DISK2S2.to_string()];
    expected.sort();
    assert_eq!(found, expected);

    assert!(graph.in_branch(DISK3, ROOT));
    assert!(!graph.in_branch(DISK0S2, DISK2));
}

#[test]
fn describe_reports_capabilities() {
    let (_hw, backend) = macbook();
    let graph = DeviceGraph::load(backend).expect("load");

    let report = graph.describe(DISK3).expect("describe");
    assert_eq!(report.main_type, DeviceInterfaceType::OpticalDrive);
    assert_eq!(report.icon, "drive-optical");
    let optical = report
        .interfaces
        .iter()
        .find(|i| i.interface == DeviceInterfaceType::OpticalDrive)
        .expect("optical report");
    assert_eq!(optical.properties.get_str("driveType"), Some("CdromDrive"));
}

#[test]
fn apply_announces_additions_and_removals() {
    let (hw, backend) = macbook();
    let graph = DeviceGraph::load(backend).expect("load");
    let mut events = graph.subscribe();

    let added = hw.registry.add(spare_battery());
    graph.apply(&added);
    graph.apply(&added);
    assert!(graph.device("IOService:/AppleSmartBattery2").is_some());

    let removed = hw
        .registry
        .remove("IOService:/AppleSmartBattery2")
        .expect("present");
    graph.apply(&removed);
    graph.apply(&RegistryEvent::Added("IOService:/Ghost".to_string()));

    assert_eq!(
        drain_registry(&mut events),
        vec![
            RegistryEvent::Added("IOService:/AppleSmartBattery2".to_string()),
            RegistryEvent::Removed("IOService:/AppleSmartBattery2".to_string()),
        ]
    );
}

#[test]
fn refresh_keeps_existing_nodes() {
    let (hw, backend) = macbook();
    let graph = DeviceGraph::load(backend).expect("load");
    let before = graph.device(DISK3).expect("disk3");
    let mut events = graph.subscribe();

    hw.registry.remove(DISK2S2);
    hw.registry.add(spare_battery());
    graph.refresh().expect("refresh");

    let after = graph.device(DISK3).expect("disk3");
    assert!(std::sync::Arc::ptr_eq(&before, &after));
    assert_eq!(
        drain_registry(&mut events),
        vec![
            RegistryEvent::Removed(DISK2S2.to_string()),
            RegistryEvent::Added("IOService:/AppleSmartBattery2".to_string()),
        ]
    );
}

#[tokio::test]
async fn follow_applies_a_notification_stream() {
    let (hw, backend) = macbook();
    let graph = DeviceGraph::load(backend).expect("load");

    let added = hw.registry.add(spare_battery());
    let removed = RegistryEvent::Removed(DISK2S2.to_string());
    graph.follow(futures::stream::iter(vec![added, removed])).await;

    assert!(graph.device("IOService:/AppleSmartBattery2").is_some());
    assert!(graph.device(DISK2S2).is_none());
}

#[tokio::test]
async fn volume_calls() {
    let (hw, backend) = macbook();
    let graph = DeviceGraph::load(backend).expect("load");

    graph
        .invoke_volume_call(VolumeCall::Mount, DISK2S1)
        .await
        .expect("mount");
    assert_eq!(
        graph
            .invoke_volume_call(VolumeCall::Mount, DISK2S1)
            .await
            .expect_err("already mounted")
            .kind,
        HwErrorKind::OperationRejected
    );
    graph
        .invoke_volume_call(VolumeCall::Unmount, DISK2S1)
        .await
        .expect("unmount");
    assert_eq!(hw.session.mount_path("disk2s1"), None);

    assert_eq!(
        graph
            .invoke_volume_call(VolumeCall::Eject, DISK2S1)
            .await
            .expect_err("not optical")
            .kind,
        HwErrorKind::UnsupportedCapability
    );
    assert_eq!(
        graph
            .invoke_volume_call(VolumeCall::Mount, CPU0)
            .await
            .expect_err("not storage")
            .kind,
        HwErrorKind::UnsupportedCapability
    );
    assert_eq!(
        graph
            .invoke_volume_call(VolumeCall::Eject, "IOService:/Nowhere")
            .await
            .expect_err("unknown")
            .kind,
        HwErrorKind::NotFound
    );

    graph
        .invoke_volume_call(VolumeCall::Eject, DISK3)
        .await
        .expect("eject");
    assert!(hw.session.is_ejected("disk3"));
}
