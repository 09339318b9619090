// SPDX-License-Identifier: GPL-3.0-only

mod common;

use common::*;
use hwkit_core::types::{
    Bus, ChargeState, DeviceInterfaceType as T, DriveType, InstructionSet, MediumType, TypeSet,
    VolumeUsage,
};
use hwkit_core::{DeviceNode, Settings};

#[test]
fn optical_media_is_drive_and_optical() {
    let (_hw, backend) = macbook();
    let disk3 = node(&backend, DISK3);

    assert_eq!(disk3.device_types(), T::OpticalDrive | T::StorageDrive);
    assert_eq!(disk3.main_type(), T::OpticalDrive);
    assert_eq!(
        disk3.interfaces(),
        vec![
            T::GenericInterface,
            T::Block,
            T::StorageAccess,
            T::StorageDrive,
            T::OpticalDrive
        ]
    );
    assert!(disk3.as_storage_volume().is_none());
    assert_eq!(disk3.icon(), "drive-optical");
    assert_eq!(disk3.vendor(), "MATSHITA");
}

#[test]
fn superdrive_supported_media() {
    let (_hw, backend) = macbook();
    let disk3 = node(&backend, DISK3);
    let drive = disk3.as_optical_drive().expect("optical drive");

    assert_eq!(
        drive.supported_media(),
        MediumType::Cdr
            | MediumType::Cdrw
            | MediumType::Dvd
            | MediumType::Dvdr
            | MediumType::Dvdrw
            | MediumType::Dvdplusr
            | MediumType::Dvdplusrw
    );
    assert_eq!(drive.read_speed(), 0);
    assert!(drive.write_speeds().is_empty());

    let storage = drive.storage_drive();
    assert_eq!(storage.bus(), Bus::Usb);
    assert_eq!(storage.drive_type(), DriveType::CdromDrive);
    assert!(storage.is_removable());
    assert!(storage.is_hotpluggable());
}

#[test]
fn characteristics_beyond_search_depth_are_not_found() {
    let (_hw, backend) = macbook_with(Settings {
        characteristics_search_depth: 1,
        ..Settings::default()
    });
    let disk3 = node(&backend, DISK3);
    let drive = disk3.as_optical_drive().expect("optical drive");
    assert!(drive.supported_media().is_empty());
}

#[test]
fn block_numbers_and_device_path() {
    let (_hw, backend) = macbook();
    let disk3 = node(&backend, DISK3);
    let block = disk3.as_block().expect("block");
    assert_eq!(block.device(), "/dev/disk3");
    assert_eq!(block.device_major(), 1);
    assert_eq!(block.device_minor(), 9);

    let cpu = node(&backend, CPU0);
    assert!(cpu.as_block().is_none());
}

#[test]
fn internal_and_usb_drives() {
    let (_hw, backend) = macbook();

    let ssd = node(&backend, DISK0);
    assert_eq!(ssd.main_type(), T::StorageDrive);
    let drive = ssd.as_storage_drive().expect("storage drive");
    assert_eq!(drive.bus(), Bus::Sata);
    assert_eq!(drive.drive_type(), DriveType::HardDisk);
    assert!(!drive.is_removable());
    assert!(!drive.is_hotpluggable());
    assert_eq!(ssd.icon(), "drive-harddisk");
    assert_eq!(ssd.description(), "APPLE SSD SM0512F Media");

    let stick = node(&backend, DISK2);
    let drive = stick.as_storage_drive().expect("storage drive");
    assert_eq!(drive.bus(), Bus::Usb);
    assert!(drive.is_removable());
    assert_eq!(stick.icon(), "drive-removable-media-usb");
    assert_eq!(stick.product(), "Cruzer Blade");
}

#[test]
fn volumes() {
    let (_hw, backend) = macbook();

    let stick = node(&backend, DISK2S1);
    assert_eq!(stick.device_types(), TypeSet::from(T::StorageVolume));
    let volume = stick.as_storage_volume().expect("storage volume");
    assert_eq!(volume.fs_type(), "msdos");
    assert_eq!(volume.label(), "STICK");
    assert_eq!(volume.uuid(), "4A2B-19F0");
    assert_eq!(volume.usage(), VolumeUsage::FileSystem);
    assert!(!volume.is_ignored());
    assert_eq!(stick.description(), "STICK");

    let efi = node(&backend, DISK2S2);
    assert!(efi.as_storage_volume().expect("storage volume").is_ignored());
    assert!(efi.as_storage_access().expect("storage access").is_ignored());
    assert_eq!(
        efi.property("isIgnored"),
        Some(hwkit_core::types::PropertyValue::Bool(true))
    );
}

#[test]
fn processor_and_battery() {
    let (_hw, backend) = macbook();

    let cpu = node(&backend, CPU0);
    assert_eq!(cpu.main_type(), T::Processor);
    let processor = cpu.as_processor().expect("processor");
    assert_eq!(processor.number(), 0);
    assert_eq!(processor.max_speed(), 3500);
    assert!(processor.can_change_frequency());
    let sets = processor.instruction_sets();
    assert!(sets.contains(InstructionSet::IntelMmx));
    assert!(sets.contains(InstructionSet::IntelSse42));
    assert!(sets.contains(InstructionSet::IntelAvx));
    assert!(!sets.contains(InstructionSet::IntelAvx2));
    assert_eq!(cpu.icon(), "cpu");
    assert_eq!(cpu.vendor(), "GenuineIntel");

    let smart = node(&backend, BATTERY);
    let battery = smart.as_battery().expect("battery");
    assert_eq!(battery.charge_percent(), 70);
    assert_eq!(battery.capacity(), 71);
    assert_eq!(battery.charge_state(), ChargeState::Charging);
    assert!((battery.voltage() - 12.415).abs() < 1e-9);
    assert_eq!(battery.cycle_count(), 210);
    assert_eq!(smart.description(), "Smart Battery");
    assert_eq!(smart.icon(), "battery");
}

#[test]
fn root_describes_the_host() {
    let (_hw, backend) = macbook();
    let root = node(&backend, ROOT);

    assert!(root.is_root());
    assert!(root.parent().is_none());
    assert_eq!(root.icon(), "computer-laptop");
    assert_eq!(root.vendor(), "Apple");
    assert_eq!(root.product(), "MacBookPro11,3");
    assert_eq!(root.description(), "MacBookPro11,3");
}

#[test]
fn unknown_devices_inherit_from_the_nearest_known_ancestor() {
    let (_hw, backend) = macbook();

    let scheme = node(&backend, PARTITION_SCHEME);
    assert_eq!(scheme.main_type(), T::Unknown);
    assert_eq!(scheme.icon(), "drive-harddisk");
    assert_eq!(scheme.vendor(), "APPLE");
    assert_eq!(scheme.description(), "APPLE SSD SM0512F Media");

    let services = node(&backend, DVD_SERVICES);
    assert_eq!(services.parent().map(DeviceNode::udi), Some(SCSI));
    assert_eq!(services.icon(), "computer-laptop");
    assert_eq!(services.description(), "MacBookPro11,3");
}

#[test]
fn empty_or_unknown_udi_is_inert() {
    let (_hw, backend) = macbook();

    for udi in ["", "IOService:/Nowhere"] {
        let inert = DeviceNode::from_udi(backend.clone(), udi);
        assert!(!inert.is_valid());
        assert!(!inert.is_root());
        assert_eq!(inert.device_types(), TypeSet::from(T::Unknown));
        assert!(inert.parent().is_none());
        assert!(inert.properties().is_empty());
        assert_eq!(inert.icon(), "drive-harddisk");
        assert_eq!(inert.description(), "Device");
        assert_eq!(inert.interfaces(), vec![T::GenericInterface]);
    }
}

#[test]
fn ancestry_ends_at_the_root() {
    let (_hw, backend) = macbook();
    let disk3 = node(&backend, DISK3);
    let chain: Vec<&str> = disk3.ancestors().map(DeviceNode::udi).collect();
    assert_eq!(chain, vec![DVD_SERVICES, SCSI, ROOT]);
}

#[test]
fn registry_entries_are_released() {
    let (hw, backend) = macbook();
    {
        let disk3 = node(&backend, DISK3);
        let _ = disk3.ancestors().count();
        let _ = disk3.as_optical_drive().map(|d| d.supported_media());
    }
    assert_eq!(hw.registry.live_entries(), 0);
    assert!(hw.registry.released_entries() >= 4);
    assert_eq!(hw.session.open_handles(), 0);
}

#[test]
fn report_lists_interfaces_without_generic() {
    let (_hw, backend) = macbook();
    let disk0s2 = node(&backend, DISK0S2);
    let report = disk0s2.report().expect("report");

    assert_eq!(report.main_type, T::StorageVolume);
    assert_eq!(report.emblems, vec!["emblem-mounted".to_string()]);
    let interfaces: Vec<T> = report.interfaces.iter().map(|i| i.interface).collect();
    assert_eq!(interfaces, vec![T::Block, T::StorageAccess, T::StorageVolume]);

    let access = &report.interfaces[1].properties;
    assert_eq!(access.get_str("filePath"), Some("/"));
    assert_eq!(access.get_bool("accessible"), Some(true));
}
