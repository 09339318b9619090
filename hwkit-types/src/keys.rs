// SPDX-License-Identifier: GPL-3.0-only

//! Well-known registry property names.
//!
//! Backends translate their native data into this vocabulary so the
//! classifier and capability objects stay platform independent.

pub const BSD_NAME: &str = "BSD Name";
pub const BSD_MAJOR: &str = "BSD Major";
pub const BSD_MINOR: &str = "BSD Minor";
pub const LEAF: &str = "Leaf";
pub const SIZE: &str = "Size";
pub const REMOVABLE: &str = "Removable";
pub const CONTENT: &str = "Content";
pub const OPEN: &str = "Open";
pub const UUID: &str = "UUID";
pub const CPU_NUMBER: &str = "IOCPUNumber";

pub const DEVICE_CHARACTERISTICS: &str = "Device Characteristics";
pub const CD_FEATURES: &str = "CD Features";
pub const DVD_FEATURES: &str = "DVD Features";
pub const BD_FEATURES: &str = "BD Features";

/// Content hint of an audio CD track.
pub const CONTENT_AUDIO_CD: &str = "CD_DA";

pub mod battery {
    pub const MANUFACTURER: &str = "Manufacturer";
    pub const DEVICE_NAME: &str = "DeviceName";
    pub const SERIAL: &str = "BatterySerialNumber";
    pub const INSTALLED: &str = "BatteryInstalled";
    pub const CURRENT_CAPACITY: &str = "CurrentCapacity";
    pub const MAX_CAPACITY: &str = "MaxCapacity";
    pub const DESIGN_CAPACITY: &str = "DesignCapacity";
    pub const IS_CHARGING: &str = "IsCharging";
    pub const EXTERNAL_CONNECTED: &str = "ExternalConnected";
    pub const FULLY_CHARGED: &str = "FullyCharged";
    pub const VOLTAGE: &str = "Voltage";
    pub const CYCLE_COUNT: &str = "CycleCount";
}

/// Keys of the disk description dictionary a native session returns.
pub mod description {
    pub const VOLUME_PATH: &str = "DAVolumePath";
    pub const VOLUME_KIND: &str = "DAVolumeKind";
    pub const VOLUME_NAME: &str = "DAVolumeName";
    pub const DEVICE_VENDOR: &str = "DADeviceVendor";
    pub const DEVICE_MODEL: &str = "DADeviceModel";
    pub const DEVICE_PROTOCOL: &str = "DADeviceProtocol";
    pub const DEVICE_INTERNAL: &str = "DADeviceInternal";
    pub const MEDIA_NAME: &str = "DAMediaName";
}
