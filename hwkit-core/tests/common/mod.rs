// SPDX-License-Identifier: GPL-3.0-only

#![allow(dead_code)]

use std::sync::Arc;

use hwkit_core::contracts::DeviceEvent;
use hwkit_core::{Backend, ClassProfile, DeviceNode, Settings};
use hwkit_fakehw::FakeHardware;
use tokio::sync::broadcast;

pub const ROOT: &str = "IOService:/";
pub const CPU0: &str = "IOService:/AppleACPIPlatformExpert/CPU0@0/AppleACPICPU";
pub const BATTERY: &str =
    "IOService:/AppleACPIPlatformExpert/SMB0@0/AppleSmartBatteryManager/AppleSmartBattery";
pub const DISK0: &str = "IOService:/AppleACPIPlatformExpert/PCI0@0/AppleACPIPCI/SATA@1F,2/AppleAHCIDiskDriver/APPLE SSD Media";
pub const PARTITION_SCHEME: &str = "IOService:/AppleACPIPlatformExpert/PCI0@0/AppleACPIPCI/SATA@1F,2/AppleAHCIDiskDriver/APPLE SSD Media/IOGUIDPartitionScheme";
pub const DISK0S2: &str = "IOService:/AppleACPIPlatformExpert/PCI0@0/AppleACPIPCI/SATA@1F,2/AppleAHCIDiskDriver/APPLE SSD Media/IOGUIDPartitionScheme/Macintosh HD@2";
pub const DISK2: &str = "IOService:/AppleACPIPlatformExpert/PCI0@0/AppleACPIPCI/XHC1@14/IOUSBHostDevice@14100000/IOUSBInterface@0/IOUSBMassStorageDriver/SanDisk Cruzer Media";
pub const DISK2S1: &str = "IOService:/AppleACPIPlatformExpert/PCI0@0/AppleACPIPCI/XHC1@14/IOUSBHostDevice@14100000/IOUSBInterface@0/IOUSBMassStorageDriver/SanDisk Cruzer Media/STICK@1";
pub const DISK2S2: &str = "IOService:/AppleACPIPlatformExpert/PCI0@0/AppleACPIPCI/XHC1@14/IOUSBHostDevice@14100000/IOUSBInterface@0/IOUSBMassStorageDriver/SanDisk Cruzer Media/EFI@2";
pub const SCSI: &str = "IOService:/AppleACPIPlatformExpert/PCI0@0/AppleACPIPCI/XHC1@14/IOUSBHostDevice@14200000/IOUSBInterface@0/IOSCSIPeripheralDeviceType05";
pub const DVD_SERVICES: &str = "IOService:/AppleACPIPlatformExpert/PCI0@0/AppleACPIPCI/XHC1@14/IOUSBHostDevice@14200000/IOUSBInterface@0/IOSCSIPeripheralDeviceType05/IODVDServices";
pub const DISK3: &str = "IOService:/AppleACPIPlatformExpert/PCI0@0/AppleACPIPCI/XHC1@14/IOUSBHostDevice@14200000/IOUSBInterface@0/IOSCSIPeripheralDeviceType05/IODVDServices/MATSHITA DVD-R UJ-8A8 Media";

pub fn macbook_with(settings: Settings) -> (FakeHardware, Arc<Backend>) {
    let hardware = FakeHardware::macbook().expect("bundled fixture parses");
    let profile = hardware
        .profile
        .as_deref()
        .and_then(ClassProfile::by_name)
        .unwrap_or_default();
    let backend = Backend::new(
        hardware.registry.clone(),
        hardware.session.clone(),
        profile,
        settings,
    );
    (hardware, backend)
}

pub fn macbook() -> (FakeHardware, Arc<Backend>) {
    macbook_with(Settings::default())
}

pub fn node(backend: &Arc<Backend>, udi: &str) -> DeviceNode {
    let node = DeviceNode::from_udi(backend.clone(), udi);
    assert!(node.is_valid(), "{udi} is in the fixture");
    node
}

/// Everything broadcast so far.
pub fn drain(receiver: &mut broadcast::Receiver<DeviceEvent>) -> Vec<DeviceEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
