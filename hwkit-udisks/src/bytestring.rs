// SPDX-License-Identifier: GPL-3.0-only

//! UDisks2 reports device and mount paths as NUL-terminated byte arrays.

use zbus::zvariant::OwnedValue;

pub fn owned_value_to_bytestring(value: &OwnedValue) -> Option<String> {
    let bytes: Vec<u8> = value.clone().try_into().ok()?;
    Some(decode_c_string_bytes(&bytes))
}

pub fn decode_c_string_bytes(bytes: &[u8]) -> String {
    let raw = bytes.split(|b| *b == 0).next().unwrap_or(bytes);
    String::from_utf8_lossy(raw).to_string()
}

pub fn decode_mount_points(mount_points: Vec<Vec<u8>>) -> Vec<String> {
    mount_points
        .into_iter()
        .map(|mp| decode_c_string_bytes(&mp))
        .filter(|mp| !mp.is_empty())
        .collect()
}

/// `/dev/sr0` -> `sr0`.
pub fn kernel_name(device: &str) -> &str {
    device.strip_prefix("/dev/").unwrap_or(device)
}
