// SPDX-License-Identifier: GPL-3.0-only

//! Storage-related enumerations shared by drives, volumes and optical drives.

use enumflags2::{BitFlags, bitflags};
use serde::{Deserialize, Serialize};

/// Bus a storage drive is attached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bus {
    Ide,
    Usb,
    Ieee1394,
    Scsi,
    Sata,
    Platform,
}

impl Bus {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ide => "Ide",
            Self::Usb => "Usb",
            Self::Ieee1394 => "Ieee1394",
            Self::Scsi => "Scsi",
            Self::Sata => "Sata",
            Self::Platform => "Platform",
        }
    }
}

/// Physical kind of a storage drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveType {
    HardDisk,
    CdromDrive,
    Floppy,
    Tape,
    CompactFlash,
    MemoryStick,
    SmartMedia,
    SdMmc,
    Xd,
}

impl DriveType {
    pub fn name(self) -> &'static str {
        match self {
            Self::HardDisk => "HardDisk",
            Self::CdromDrive => "CdromDrive",
            Self::Floppy => "Floppy",
            Self::Tape => "Tape",
            Self::CompactFlash => "CompactFlash",
            Self::MemoryStick => "MemoryStick",
            Self::SmartMedia => "SmartMedia",
            Self::SdMmc => "SdMmc",
            Self::Xd => "Xd",
        }
    }
}

/// What a storage volume is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeUsage {
    Other,
    Unused,
    FileSystem,
    PartitionTable,
    Raid,
    Encrypted,
}

impl VolumeUsage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Other => "Other",
            Self::Unused => "Unused",
            Self::FileSystem => "FileSystem",
            Self::PartitionTable => "PartitionTable",
            Self::Raid => "Raid",
            Self::Encrypted => "Encrypted",
        }
    }
}

/// Media an optical drive can handle.
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediumType {
    Cdr = 1 << 0,
    Cdrw = 1 << 1,
    Dvd = 1 << 2,
    Dvdr = 1 << 3,
    Dvdrw = 1 << 4,
    Dvdram = 1 << 5,
    Dvdplusr = 1 << 6,
    Dvdplusrw = 1 << 7,
    Dvdplusdl = 1 << 8,
    Dvdplusdlrw = 1 << 9,
    Bd = 1 << 10,
    Bdr = 1 << 11,
    Bdre = 1 << 12,
    HdDvd = 1 << 13,
    HdDvdr = 1 << 14,
    HdDvdrw = 1 << 15,
}

pub type MediumTypes = BitFlags<MediumType>;

impl MediumType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Cdr => "Cdr",
            Self::Cdrw => "Cdrw",
            Self::Dvd => "Dvd",
            Self::Dvdr => "Dvdr",
            Self::Dvdrw => "Dvdrw",
            Self::Dvdram => "Dvdram",
            Self::Dvdplusr => "Dvdplusr",
            Self::Dvdplusrw => "Dvdplusrw",
            Self::Dvdplusdl => "Dvdplusdl",
            Self::Dvdplusdlrw => "Dvdplusdlrw",
            Self::Bd => "Bd",
            Self::Bdr => "Bdr",
            Self::Bdre => "Bdre",
            Self::HdDvd => "HdDvd",
            Self::HdDvdr => "HdDvdr",
            Self::HdDvdrw => "HdDvdrw",
        }
    }
}

/// Feature masks of the SCSI multimedia command set, as reported in a
/// drive's `Device Characteristics`.
pub mod mmc {
    pub const CD_WRITE_ONCE: i64 = 1 << 2;
    pub const CD_REWRITABLE: i64 = 1 << 3;

    pub const DVD_READ_STRUCTURES: i64 = 1 << 1;
    pub const DVD_WRITE_ONCE: i64 = 1 << 2;
    pub const DVD_RANDOM_WRITABLE: i64 = 1 << 3;
    pub const DVD_REWRITABLE: i64 = 1 << 4;
    pub const DVD_PLUS_R: i64 = 1 << 7;
    pub const DVD_PLUS_RW: i64 = 1 << 8;
    pub const DVD_HD_READ: i64 = 1 << 9;
    pub const DVD_HD_R: i64 = 1 << 10;
    pub const DVD_HD_RW: i64 = 1 << 12;

    pub const BD_READ: i64 = 1 << 0;
    pub const BD_WRITE: i64 = 1 << 1;
}
