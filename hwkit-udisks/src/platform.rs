// SPDX-License-Identifier: GPL-3.0-only

//! Processors, batteries and host identity from procfs and sysfs.

use std::path::Path;

use procfs::{CpuInfo, Current};
use tracing::{debug, warn};

use hwkit_types::keys::{self, battery as key};
use hwkit_types::{HostInfo, PropertyMap};

use crate::records::{BATTERY_CLASS, CPU_CLASS, ROOT_CLASS, ROOT_UDI, Record};

const CPU_SYSFS: &str = "/sys/devices/system/cpu";
const POWER_SUPPLY_SYSFS: &str = "/sys/class/power_supply";
const DMI_SYSFS: &str = "/sys/class/dmi/id";

/// SMBIOS chassis types of notebooks, tablets and convertibles.
const PORTABLE_CHASSIS: [u32; 8] = [8, 9, 10, 11, 14, 30, 31, 32];

fn read_attr(dir: &Path, name: &str) -> Option<String> {
    std::fs::read_to_string(dir.join(name))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn read_khz_as_mhz(dir: &Path, name: &str) -> u64 {
    read_attr(dir, name)
        .and_then(|s| s.parse::<u64>().ok())
        .map(|khz| khz / 1000)
        .unwrap_or(0)
}

fn is_portable_chassis(chassis: Option<&str>) -> bool {
    chassis
        .and_then(|c| c.parse::<u32>().ok())
        .is_some_and(|c| PORTABLE_CHASSIS.contains(&c))
}

/// Feature flags the kernel reports for processor `cpu`.
fn cpu_features(cpuinfo: &CpuInfo, cpu: usize) -> Vec<String> {
    cpuinfo
        .flags(cpu)
        .unwrap_or_default()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn host_info() -> HostInfo {
    let dmi = Path::new(DMI_SYSFS);
    let mut host = HostInfo {
        vendor: read_attr(dmi, "sys_vendor").unwrap_or_default(),
        model: read_attr(dmi, "product_name").unwrap_or_default(),
        portable: is_portable_chassis(read_attr(dmi, "chassis_type").as_deref()),
        ..HostInfo::default()
    };

    match CpuInfo::current() {
        Ok(cpuinfo) => {
            host.cpu_vendor = cpuinfo.vendor_id(0).unwrap_or_default().to_string();
            host.cpu_brand = cpuinfo.model_name(0).unwrap_or_default().to_string();
            host.cpu_frequency_mhz = cpuinfo
                .get_field(0, "cpu MHz")
                .and_then(|mhz| mhz.trim().parse::<f64>().ok())
                .map(|mhz| mhz.round() as u64)
                .unwrap_or(0);
            host.cpu_features = cpu_features(&cpuinfo, 0);
        }
        Err(e) => warn!("Failed to read /proc/cpuinfo: {e}"),
    }

    let cpufreq = Path::new(CPU_SYSFS).join("cpu0/cpufreq");
    host.cpu_min_frequency_mhz = read_khz_as_mhz(&cpufreq, "cpuinfo_min_freq");
    host.cpu_max_frequency_mhz = read_khz_as_mhz(&cpufreq, "cpuinfo_max_freq");
    host
}

pub fn root_record() -> Record {
    Record::new(ROOT_UDI, "", ROOT_CLASS)
}

/// One record per logical processor.
pub fn cpu_records() -> Vec<Record> {
    let cores = match CpuInfo::current() {
        Ok(cpuinfo) => cpuinfo.num_cores(),
        Err(e) => {
            warn!("Failed to read /proc/cpuinfo: {e}");
            return Vec::new();
        }
    };

    (0..cores)
        .map(|n| {
            let mut record = Record::new(format!("{CPU_SYSFS}/cpu{n}"), ROOT_UDI, CPU_CLASS);
            record.properties.insert(keys::CPU_NUMBER, n as i64);
            record
        })
        .collect()
}

/// Translate `power_supply` attributes into the battery vocabulary.
///
/// Energy (µWh) is preferred over charge (µAh) when both are present.
pub fn battery_properties(attr: impl Fn(&str) -> Option<String>) -> PropertyMap {
    let int = |name: &str| attr(name).and_then(|v| v.parse::<i64>().ok());
    let (now, full, design) = if int("energy_full").is_some() {
        ("energy_now", "energy_full", "energy_full_design")
    } else {
        ("charge_now", "charge_full", "charge_full_design")
    };

    let mut props = PropertyMap::new();
    let mut copy_text = |from: &str, to: &str| {
        if let Some(value) = attr(from) {
            props.insert(to, value);
        }
    };
    copy_text("manufacturer", key::MANUFACTURER);
    copy_text("model_name", key::DEVICE_NAME);
    copy_text("serial_number", key::SERIAL);

    // Capacities in mWh or mAh, voltage in mV.
    for (from, to) in [
        (now, key::CURRENT_CAPACITY),
        (full, key::MAX_CAPACITY),
        (design, key::DESIGN_CAPACITY),
        ("voltage_now", key::VOLTAGE),
    ] {
        if let Some(value) = int(from) {
            props.insert(to, value / 1000);
        }
    }
    if let Some(cycles) = int("cycle_count") {
        props.insert(key::CYCLE_COUNT, cycles);
    }

    if let Some(present) = int("present") {
        props.insert(key::INSTALLED, present != 0);
    }

    let status = attr("status").unwrap_or_default();
    props.insert(key::IS_CHARGING, status == "Charging");
    props.insert(key::FULLY_CHARGED, status == "Full");
    props.insert(
        key::EXTERNAL_CONNECTED,
        matches!(status.as_str(), "Charging" | "Full" | "Not charging"),
    );
    props
}

pub fn battery_records() -> Vec<Record> {
    let entries = match std::fs::read_dir(POWER_SUPPLY_SYSFS) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("No power supplies: {e}");
            return Vec::new();
        }
    };

    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|dir| read_attr(dir, "type").as_deref() == Some("Battery"))
        .map(|dir| {
            let mut record = Record::new(dir.to_string_lossy(), ROOT_UDI, BATTERY_CLASS);
            record.properties = battery_properties(|name| read_attr(&dir, name));
            record
        })
        .collect()
}
