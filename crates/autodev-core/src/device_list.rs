//! Parsing of comma-separated device lists such as `"GPU.0, MYRIAD,CPU"`.

use crate::types::DeviceName;

/// Split a device list on `,`, trimming whitespace and dropping empty entries.
/// Order and duplicates are preserved.
pub fn parse_device_list(list: &str) -> Vec<DeviceName> {
    list.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// `true` when `device` belongs to `family`, e.g. `"GPU.1"` to `"GPU"`.
pub fn has_family_prefix(device: &str, family: &str) -> bool {
    device.starts_with(family)
}
