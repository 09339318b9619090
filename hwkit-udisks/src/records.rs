// SPDX-License-Identifier: GPL-3.0-only

//! Registry records built from a UDisks2 `GetManagedObjects` snapshot.
//!
//! Drives become parents of their whole-disk block device, partitions
//! hang off their partition table. Optical capabilities are published on
//! the drive record as `Device Characteristics` feature masks, one level
//! above the block device that carries the medium.

use std::collections::{BTreeMap, HashMap};

use zbus::zvariant::{OwnedObjectPath, OwnedValue};

use hwkit_types::storage::mmc;
use hwkit_types::{PropertyMap, keys};

use crate::bytestring::{kernel_name, owned_value_to_bytestring};

pub const ROOT_UDI: &str = "/org/freedesktop/UDisks2";

pub const BLOCK_IFACE: &str = "org.freedesktop.UDisks2.Block";
pub const DRIVE_IFACE: &str = "org.freedesktop.UDisks2.Drive";
pub const PARTITION_IFACE: &str = "org.freedesktop.UDisks2.Partition";
pub const PARTITION_TABLE_IFACE: &str = "org.freedesktop.UDisks2.PartitionTable";
pub const FILESYSTEM_IFACE: &str = "org.freedesktop.UDisks2.Filesystem";

pub const ROOT_CLASS: &str = "computer";
pub const DRIVE_CLASS: &str = "drive";
pub const BLOCK_CLASS: &str = "block";
pub const OPTICAL_CLASS: &str = "optical_media";
pub const CPU_CLASS: &str = "cpu";
pub const BATTERY_CLASS: &str = "battery";

pub type Properties = HashMap<String, OwnedValue>;
pub type Interfaces = HashMap<String, Properties>;
pub type ManagedObjects = BTreeMap<String, Interfaces>;

/// One registry entry, detached from D-Bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub udi: String,
    pub parent: String,
    pub classes: Vec<String>,
    pub properties: PropertyMap,
}

impl Record {
    pub fn new(udi: impl Into<String>, parent: impl Into<String>, class: &str) -> Self {
        Self {
            udi: udi.into(),
            parent: parent.into(),
            classes: vec![class.to_string()],
            properties: PropertyMap::new(),
        }
    }
}

pub fn as_string(value: &OwnedValue) -> Option<String> {
    String::try_from(value.clone()).ok()
}

pub fn as_object_path(value: &OwnedValue) -> Option<String> {
    OwnedObjectPath::try_from(value.clone())
        .ok()
        .map(|p| p.as_str().to_string())
        .or_else(|| as_string(value))
}

pub fn as_u64(value: &OwnedValue) -> Option<u64> {
    if let Ok(parsed) = u64::try_from(value.clone()) {
        Some(parsed)
    } else {
        u32::try_from(value.clone()).ok().map(u64::from)
    }
}

pub fn as_bool(value: &OwnedValue) -> Option<bool> {
    bool::try_from(value.clone()).ok()
}

pub fn as_strings(value: &OwnedValue) -> Vec<String> {
    Vec::<String>::try_from(value.clone()).unwrap_or_default()
}

fn prop<T>(props: &Properties, name: &str, parse: fn(&OwnedValue) -> Option<T>) -> Option<T> {
    props.get(name).and_then(parse)
}

/// Feature masks equivalent to a drive's `MediaCompatibility` list, or
/// `None` when the drive handles no optical media.
pub fn characteristics_from_compatibility(compatibility: &[String]) -> Option<PropertyMap> {
    if !compatibility.iter().any(|m| m.starts_with("optical_")) {
        return None;
    }

    let (mut cd, mut dvd, mut bd) = (0_i64, 0_i64, 0_i64);
    for medium in compatibility {
        match medium.as_str() {
            "optical_cd_r" => cd |= mmc::CD_WRITE_ONCE,
            "optical_cd_rw" => cd |= mmc::CD_REWRITABLE,
            "optical_dvd" => dvd |= mmc::DVD_READ_STRUCTURES,
            "optical_dvd_r" => dvd |= mmc::DVD_WRITE_ONCE,
            "optical_dvd_rw" => dvd |= mmc::DVD_REWRITABLE,
            "optical_dvd_ram" => dvd |= mmc::DVD_RANDOM_WRITABLE,
            "optical_dvd_plus_r" => dvd |= mmc::DVD_PLUS_R,
            "optical_dvd_plus_rw" => dvd |= mmc::DVD_PLUS_RW,
            "optical_hddvd" => dvd |= mmc::DVD_HD_READ,
            "optical_hddvd_r" => dvd |= mmc::DVD_HD_R,
            "optical_hddvd_rw" => dvd |= mmc::DVD_HD_RW,
            "optical_bd" => bd |= mmc::BD_READ,
            "optical_bd_r" | "optical_bd_re" => bd |= mmc::BD_WRITE,
            _ => {}
        }
    }

    Some(
        PropertyMap::new()
            .with(keys::CD_FEATURES, cd)
            .with(keys::DVD_FEATURES, dvd)
            .with(keys::BD_FEATURES, bd),
    )
}

fn drive_record(udi: &str, drive: &Properties) -> Record {
    let mut record = Record::new(udi, ROOT_UDI, DRIVE_CLASS);
    let compatibility = media_compatibility(drive);
    if let Some(mut characteristics) = characteristics_from_compatibility(&compatibility) {
        if let Some(model) = prop(drive, "Model", as_string) {
            characteristics.insert("Product Name", model);
        }
        record
            .properties
            .insert(keys::DEVICE_CHARACTERISTICS, characteristics);
    }
    record
}

fn media_compatibility(drive: &Properties) -> Vec<String> {
    drive
        .get("MediaCompatibility")
        .map(as_strings)
        .unwrap_or_default()
}

fn is_optical_drive(drive: Option<&Properties>) -> bool {
    drive.is_some_and(|d| media_compatibility(d).iter().any(|m| m.starts_with("optical_")))
}

fn is_audio_disc(drive: Option<&Properties>) -> bool {
    let Some(drive) = drive else {
        return false;
    };
    let tracks = |name| prop(drive, name, as_u64).unwrap_or(0);
    tracks("OpticalNumAudioTracks") > 0 && tracks("OpticalNumDataTracks") == 0
}

fn block_record(udi: &str, interfaces: &Interfaces, managed: &ManagedObjects) -> Option<Record> {
    let block = interfaces.get(BLOCK_IFACE)?;
    let drive_path = prop(block, "Drive", as_object_path).filter(|p| p != "/");
    let drive = drive_path
        .as_ref()
        .and_then(|p| managed.get(p))
        .and_then(|i| i.get(DRIVE_IFACE));
    let size = prop(block, "Size", as_u64).unwrap_or(0);

    // Unused loop devices.
    if size == 0 && drive_path.is_none() {
        return None;
    }

    let partition = interfaces.get(PARTITION_IFACE);
    let parent = partition
        .and_then(|p| prop(p, "Table", as_object_path))
        .or_else(|| drive_path.clone())
        .unwrap_or_else(|| ROOT_UDI.to_string());
    let leaf = partition.is_some()
        || (!interfaces.contains_key(PARTITION_TABLE_IFACE) && drive_path.is_none());

    let device = prop(block, "PreferredDevice", owned_value_to_bytestring)
        .filter(|d| !d.is_empty())
        .or_else(|| prop(block, "Device", owned_value_to_bytestring))?;

    let mut record = Record::new(udi, parent, BLOCK_CLASS);
    if !leaf && is_optical_drive(drive) {
        record.classes.insert(0, OPTICAL_CLASS.to_string());
    }

    let props = &mut record.properties;
    props.insert(keys::BSD_NAME, kernel_name(&device));
    if let Some(number) = prop(block, "DeviceNumber", as_u64) {
        let dev = number as libc::dev_t;
        props.insert(keys::BSD_MAJOR, i64::from(libc::major(dev)));
        props.insert(keys::BSD_MINOR, i64::from(libc::minor(dev)));
    }
    props.insert(keys::LEAF, leaf);
    props.insert(keys::SIZE, size);
    if let Some(uuid) = prop(block, "IdUUID", as_string).filter(|u| !u.is_empty()) {
        props.insert(keys::UUID, uuid);
    }

    let content = if !leaf && is_audio_disc(drive) {
        keys::CONTENT_AUDIO_CD.to_string()
    } else {
        prop(block, "IdType", as_string).unwrap_or_default()
    };
    if !content.is_empty() {
        props.insert(keys::CONTENT, content);
    }

    let ignored = prop(block, "HintIgnore", as_bool).unwrap_or(false);
    props.insert(keys::OPEN, !ignored);

    let removable = drive
        .and_then(|d| prop(d, "MediaRemovable", as_bool).or_else(|| prop(d, "Removable", as_bool)))
        .unwrap_or(false);
    props.insert(keys::REMOVABLE, removable);

    Some(record)
}

/// Drive and block records, parents before children.
pub fn storage_records(managed: &ManagedObjects) -> Vec<Record> {
    let mut drives = Vec::new();
    let mut disks = Vec::new();
    let mut partitions = Vec::new();

    for (udi, interfaces) in managed {
        if let Some(drive) = interfaces.get(DRIVE_IFACE) {
            drives.push(drive_record(udi, drive));
        }
        if let Some(record) = block_record(udi, interfaces, managed) {
            if interfaces.contains_key(PARTITION_IFACE) {
                partitions.push(record);
            } else {
                disks.push(record);
            }
        }
    }

    drives.into_iter().chain(disks).chain(partitions).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbus::zvariant::Value;

    fn bytes(s: &str) -> OwnedValue {
        let mut raw = s.as_bytes().to_vec();
        raw.push(0);
        OwnedValue::try_from(Value::from(raw)).expect("byte array value")
    }

    fn path(p: &str) -> OwnedValue {
        let path = OwnedObjectPath::try_from(p).expect("object path");
        OwnedValue::try_from(Value::from(path)).expect("object path value")
    }

    fn text(s: &str) -> OwnedValue {
        OwnedValue::try_from(Value::from(s)).expect("string value")
    }

    fn strings(items: &[&str]) -> OwnedValue {
        let items: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        OwnedValue::try_from(Value::from(items)).expect("string array value")
    }

    const SR0: &str = "/org/freedesktop/UDisks2/block_devices/sr0";
    const SDB: &str = "/org/freedesktop/UDisks2/block_devices/sdb";
    const SDB1: &str = "/org/freedesktop/UDisks2/block_devices/sdb1";
    const LOOP0: &str = "/org/freedesktop/UDisks2/block_devices/loop0";
    const DVD_DRIVE: &str = "/org/freedesktop/UDisks2/drives/HL_DT_ST_DVDRAM";
    const STICK: &str = "/org/freedesktop/UDisks2/drives/SanDisk_Cruzer";

    fn managed() -> ManagedObjects {
        let mut managed = ManagedObjects::new();

        managed.insert(
            DVD_DRIVE.to_string(),
            HashMap::from([(
                DRIVE_IFACE.to_string(),
                HashMap::from([
                    ("Model".to_string(), text("DVDRAM GT80N")),
                    (
                        "MediaCompatibility".to_string(),
                        strings(&["optical_cd", "optical_cd_r", "optical_dvd", "optical_dvd_plus_r"]),
                    ),
                    ("MediaRemovable".to_string(), OwnedValue::from(true)),
                    ("OpticalNumAudioTracks".to_string(), OwnedValue::from(12_u32)),
                    ("OpticalNumDataTracks".to_string(), OwnedValue::from(0_u32)),
                ]),
            )]),
        );
        managed.insert(
            SR0.to_string(),
            HashMap::from([(
                BLOCK_IFACE.to_string(),
                HashMap::from([
                    ("Device".to_string(), bytes("/dev/sr0")),
                    ("Drive".to_string(), path(DVD_DRIVE)),
                    ("DeviceNumber".to_string(), OwnedValue::from(2816_u64)),
                    ("Size".to_string(), OwnedValue::from(700_000_000_u64)),
                ]),
            )]),
        );

        managed.insert(
            STICK.to_string(),
            HashMap::from([(
                DRIVE_IFACE.to_string(),
                HashMap::from([("Removable".to_string(), OwnedValue::from(true))]),
            )]),
        );
        managed.insert(
            SDB.to_string(),
            HashMap::from([
                (
                    BLOCK_IFACE.to_string(),
                    HashMap::from([
                        ("Device".to_string(), bytes("/dev/sdb")),
                        ("Drive".to_string(), path(STICK)),
                        ("Size".to_string(), OwnedValue::from(16_000_000_000_u64)),
                    ]),
                ),
                (PARTITION_TABLE_IFACE.to_string(), HashMap::new()),
            ]),
        );
        managed.insert(
            SDB1.to_string(),
            HashMap::from([
                (
                    BLOCK_IFACE.to_string(),
                    HashMap::from([
                        ("Device".to_string(), bytes("/dev/sdb1")),
                        ("Drive".to_string(), path(STICK)),
                        ("Size".to_string(), OwnedValue::from(15_000_000_000_u64)),
                        ("IdType".to_string(), text("vfat")),
                        ("IdUUID".to_string(), text("4A2B-19F0")),
                        ("HintIgnore".to_string(), OwnedValue::from(false)),
                    ]),
                ),
                (
                    PARTITION_IFACE.to_string(),
                    HashMap::from([("Table".to_string(), path(SDB))]),
                ),
            ]),
        );

        managed.insert(
            LOOP0.to_string(),
            HashMap::from([(
                BLOCK_IFACE.to_string(),
                HashMap::from([
                    ("Device".to_string(), bytes("/dev/loop0")),
                    ("Drive".to_string(), path("/")),
                    ("Size".to_string(), OwnedValue::from(0_u64)),
                ]),
            )]),
        );

        managed
    }

    fn find<'a>(records: &'a [Record], udi: &str) -> &'a Record {
        records
            .iter()
            .find(|r| r.udi == udi)
            .unwrap_or_else(|| panic!("{udi} missing"))
    }

    #[test]
    fn parents_come_first() {
        let records = storage_records(&managed());
        let position = |udi: &str| records.iter().position(|r| r.udi == udi);

        assert!(position(DVD_DRIVE) < position(SR0));
        assert!(position(STICK) < position(SDB));
        assert!(position(SDB) < position(SDB1));
        assert_eq!(position(LOOP0), None);
    }

    #[test]
    fn optical_disk_hangs_off_its_drive() {
        let records = storage_records(&managed());

        let drive = find(&records, DVD_DRIVE);
        assert_eq!(drive.parent, ROOT_UDI);
        let characteristics = drive
            .properties
            .get_map(keys::DEVICE_CHARACTERISTICS)
            .expect("characteristics");
        assert_eq!(
            characteristics.get_int(keys::CD_FEATURES),
            Some(mmc::CD_WRITE_ONCE)
        );
        assert_eq!(
            characteristics.get_int(keys::DVD_FEATURES),
            Some(mmc::DVD_READ_STRUCTURES | mmc::DVD_PLUS_R)
        );
        assert_eq!(characteristics.get_int(keys::BD_FEATURES), Some(0));

        let sr0 = find(&records, SR0);
        assert_eq!(sr0.parent, DVD_DRIVE);
        assert_eq!(sr0.classes, vec![OPTICAL_CLASS.to_string(), BLOCK_CLASS.to_string()]);
        assert_eq!(sr0.properties.get_str(keys::BSD_NAME), Some("sr0"));
        assert_eq!(sr0.properties.get_int(keys::BSD_MAJOR), Some(11));
        assert_eq!(sr0.properties.get_int(keys::BSD_MINOR), Some(0));
        assert_eq!(sr0.properties.get_bool(keys::LEAF), Some(false));
        assert_eq!(
            sr0.properties.get_str(keys::CONTENT),
            Some(keys::CONTENT_AUDIO_CD)
        );
        assert_eq!(sr0.properties.get_bool(keys::REMOVABLE), Some(true));
    }

    #[test]
    fn partitions_hang_off_their_table() {
        let records = storage_records(&managed());

        let sdb = find(&records, SDB);
        assert_eq!(sdb.parent, STICK);
        assert_eq!(sdb.properties.get_bool(keys::LEAF), Some(false));
        assert_eq!(sdb.classes, vec![BLOCK_CLASS.to_string()]);
        assert!(
            find(&records, STICK)
                .properties
                .get(keys::DEVICE_CHARACTERISTICS)
                .is_none()
        );

        let sdb1 = find(&records, SDB1);
        assert_eq!(sdb1.parent, SDB);
        assert_eq!(sdb1.properties.get_bool(keys::LEAF), Some(true));
        assert_eq!(sdb1.properties.get_str(keys::CONTENT), Some("vfat"));
        assert_eq!(sdb1.properties.get_str(keys::UUID), Some("4A2B-19F0"));
        assert_eq!(sdb1.properties.get_bool(keys::OPEN), Some(true));
    }

    #[test]
    fn compatibility_without_optical_media() {
        assert!(characteristics_from_compatibility(&["flash_sd".to_string()]).is_none());

        let bd = characteristics_from_compatibility(&[
            "optical_bd".to_string(),
            "optical_bd_re".to_string(),
        ])
        .expect("optical");
        assert_eq!(
            bd.get_int(keys::BD_FEATURES),
            Some(mmc::BD_READ | mmc::BD_WRITE)
        );
    }
}
