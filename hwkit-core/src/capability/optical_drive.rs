// SPDX-License-Identifier: GPL-3.0-only

use tokio::sync::broadcast;
use tracing::{debug, warn};

use hwkit_contracts::{DeviceEvent, HwError};
use hwkit_types::storage::mmc;
use hwkit_types::{MediumType, MediumTypes, PropertyMap, keys};

use super::StorageDrive;
use crate::device::DeviceNode;
use crate::eject::EjectCoordinator;

/// Translate the feature masks of a drive's `Device Characteristics`.
pub fn media_from_features(cd: i64, dvd: i64, bd: i64) -> MediumTypes {
    let mut media = MediumTypes::empty();
    let mut set = |features: i64, mask: i64, medium: MediumType| {
        if features & mask != 0 {
            media |= medium;
        }
    };

    set(cd, mmc::CD_WRITE_ONCE, MediumType::Cdr);
    set(cd, mmc::CD_REWRITABLE, MediumType::Cdrw);

    set(dvd, mmc::DVD_READ_STRUCTURES, MediumType::Dvd);
    set(dvd, mmc::DVD_WRITE_ONCE, MediumType::Dvdr);
    set(dvd, mmc::DVD_REWRITABLE, MediumType::Dvdrw);
    set(dvd, mmc::DVD_RANDOM_WRITABLE, MediumType::Dvdram);
    set(dvd, mmc::DVD_PLUS_R, MediumType::Dvdplusr);
    set(dvd, mmc::DVD_PLUS_RW, MediumType::Dvdplusrw);
    set(dvd, mmc::DVD_HD_READ, MediumType::HdDvd);
    set(dvd, mmc::DVD_HD_R, MediumType::HdDvdr);
    set(dvd, mmc::DVD_HD_RW, MediumType::HdDvdrw);

    set(bd, mmc::BD_READ, MediumType::Bd);
    set(bd, mmc::BD_WRITE, MediumType::Bdr);
    set(bd, mmc::BD_WRITE, MediumType::Bdre);

    media
}

/// An optical drive with its current medium.
pub struct OpticalDrive<'a> {
    drive: StorageDrive<'a>,
}

impl<'a> OpticalDrive<'a> {
    pub fn new(device: &'a DeviceNode) -> Self {
        Self {
            drive: StorageDrive::new(device),
        }
    }

    pub fn storage_drive(&self) -> &StorageDrive<'a> {
        &self.drive
    }

    /// Media the drive can read or write.
    ///
    /// The capabilities live in the `Device Characteristics` map of an
    /// ancestor (the SCSI device two levels up on Darwin). The search is
    /// bounded by the configured depth.
    pub fn supported_media(&self) -> MediumTypes {
        let device = self.drive.device();
        let backend = device.backend();
        let max_depth = backend.settings().characteristics_search_depth;

        let found = device
            .ancestors()
            .take(max_depth)
            .enumerate()
            .find_map(|(index, node)| {
                node.properties()
                    .get_map(keys::DEVICE_CHARACTERISTICS)
                    .map(|characteristics| (index + 1, characteristics))
            });

        let Some((depth, characteristics)) = found else {
            debug!(
                "No {} within {max_depth} ancestors of {}",
                keys::DEVICE_CHARACTERISTICS,
                device.udi()
            );
            return MediumTypes::empty();
        };

        let expected = backend.profile().characteristics_depth;
        if depth != expected {
            warn!(
                udi = device.udi(),
                depth, expected, "Device Characteristics found at an unexpected depth"
            );
        }

        let feature = |key| characteristics.get_int(key).unwrap_or(0);
        media_from_features(
            feature(keys::CD_FEATURES),
            feature(keys::DVD_FEATURES),
            feature(keys::BD_FEATURES),
        )
    }

    /// Read speed in kB/s, 0 when unknown.
    pub fn read_speed(&self) -> i64 {
        0
    }

    pub fn write_speed(&self) -> i64 {
        0
    }

    pub fn write_speeds(&self) -> Vec<i64> {
        Vec::new()
    }

    /// Unmount the medium if needed, then eject it.
    pub async fn eject(&self) -> Result<(), HwError> {
        let device = self.drive.device();
        let timeout = device.backend().settings().operation_timeout();
        EjectCoordinator::new(device, self.drive.disk(), timeout)
            .run()
            .await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.drive.device().subscribe()
    }

    pub fn report(&self) -> PropertyMap {
        let media: Vec<&str> = self.supported_media().iter().map(|m| m.name()).collect();
        let mut report = self.drive.report();
        report.insert("supportedMedia", media);
        report.insert("readSpeed", self.read_speed());
        report.insert("writeSpeed", self.write_speed());
        report.insert("writeSpeeds", self.write_speeds());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superdrive_features_map_to_media() {
        let media = media_from_features(2047, 503, 0);
        let expected = MediumType::Cdr
            | MediumType::Cdrw
            | MediumType::Dvd
            | MediumType::Dvdr
            | MediumType::Dvdrw
            | MediumType::Dvdplusr
            | MediumType::Dvdplusrw;
        assert_eq!(media, expected);
    }

    #[test]
    fn bd_write_implies_rewritable() {
        let media = media_from_features(0, 0, mmc::BD_READ | mmc::BD_WRITE);
        assert_eq!(media, MediumType::Bd | MediumType::Bdr | MediumType::Bdre);
    }

    #[test]
    fn hd_dvd_bits() {
        let media = media_from_features(0, mmc::DVD_HD_READ | mmc::DVD_HD_RW, 0);
        assert_eq!(media, MediumType::HdDvd | MediumType::HdDvdrw);
    }

    #[test]
    fn no_features_no_media() {
        assert!(media_from_features(0, 0, 0).is_empty());
    }
}
