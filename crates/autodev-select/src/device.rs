//! Accelerator selection for the AUTO device.
//!
//! Devices are sorted into family buckets, then the first non-empty
//! accelerator bucket in priority order is scanned for a device reporting
//! the workload's precision. FP32 workloads may be relaxed to FP16 devices.
//! CPU is the last resort.

use autodev_core::device_list::has_family_prefix;
use autodev_core::error::{Error, Result};
use autodev_core::traits::DeviceCore;
use autodev_core::types::{DeviceFamily, DeviceName, Precision};
use tracing::{debug, info};

/// Accelerator buckets in the order they are considered. CPU is handled apart.
pub const ACCELERATOR_PRIORITY: [DeviceFamily; 4] =
    [DeviceFamily::DGpu, DeviceFamily::Vpux, DeviceFamily::IGpu, DeviceFamily::Myriad];

/// Find the family of `device`, or `None` when it cannot be classified.
///
/// GPUs are split into discrete and integrated by looking at the full device
/// name; a GPU whose name mentions neither, or whose name cannot be read, is
/// unclassified.
pub fn classify_device(device: &str, core: &dyn DeviceCore) -> Option<DeviceFamily> {
    if has_family_prefix(device, "CPU") {
        return Some(DeviceFamily::Cpu);
    }
    if has_family_prefix(device, "MYRIAD") {
        return Some(DeviceFamily::Myriad);
    }
    if has_family_prefix(device, "VPUX") {
        return Some(DeviceFamily::Vpux);
    }
    if has_family_prefix(device, "GPU") {
        let full_name = match core.full_device_name(device) {
            Ok(name) => name,
            Err(e) => {
                debug!(device, error = %e, "full device name unavailable, skipping GPU");
                return None;
            }
        };
        if full_name.contains("iGPU") {
            return Some(DeviceFamily::IGpu);
        }
        if full_name.contains("dGPU") {
            return Some(DeviceFamily::DGpu);
        }
        debug!(device, full_name = %full_name, "GPU is neither discrete nor integrated");
        return None;
    }
    debug!(device, "unknown device family");
    None
}

/// Devices grouped by family, each bucket in input order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeviceBuckets {
    cpu: Vec<DeviceName>,
    dgpu: Vec<DeviceName>,
    igpu: Vec<DeviceName>,
    myriad: Vec<DeviceName>,
    vpux: Vec<DeviceName>,
}

impl DeviceBuckets {
    pub fn classify(devices: &[DeviceName], core: &dyn DeviceCore) -> Self {
        let mut buckets = Self::default();
        for device in devices {
            if let Some(family) = classify_device(device, core) {
                buckets.bucket_mut(family).push(device.clone());
            }
        }
        buckets
    }

    pub fn get(&self, family: DeviceFamily) -> &[DeviceName] {
        match family {
            DeviceFamily::Cpu => &self.cpu,
            DeviceFamily::DGpu => &self.dgpu,
            DeviceFamily::IGpu => &self.igpu,
            DeviceFamily::Myriad => &self.myriad,
            DeviceFamily::Vpux => &self.vpux,
        }
    }

    fn bucket_mut(&mut self, family: DeviceFamily) -> &mut Vec<DeviceName> {
        match family {
            DeviceFamily::Cpu => &mut self.cpu,
            DeviceFamily::DGpu => &mut self.dgpu,
            DeviceFamily::IGpu => &mut self.igpu,
            DeviceFamily::Myriad => &mut self.myriad,
            DeviceFamily::Vpux => &mut self.vpux,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty() && self.dgpu.is_empty() && self.igpu.is_empty() && self.myriad.is_empty() && self.vpux.is_empty()
    }

    /// The first non-empty accelerator bucket in priority order.
    pub fn preferred_accelerators(&self) -> Option<(DeviceFamily, &[DeviceName])> {
        ACCELERATOR_PRIORITY
            .iter()
            .map(|&family| (family, self.get(family)))
            .find(|(_, devices)| !devices.is_empty())
    }
}

/// Pick the device a network of `precision` should run on.
///
/// A single candidate is returned as-is. Otherwise only the highest-priority
/// non-empty accelerator bucket is searched; lower buckets are never tried
/// even if it yields nothing.
pub fn select_device(devices: &[DeviceName], precision: Precision, core: &dyn DeviceCore) -> Result<DeviceName> {
    if devices.is_empty() {
        return Err(Error::NotFound("No available device to select in AUTO plugin".to_string()));
    }
    if devices.len() == 1 {
        return Ok(devices[0].clone());
    }

    let buckets = DeviceBuckets::classify(devices, core);
    if buckets.is_empty() {
        return Err(Error::NotFound("No available device found".to_string()));
    }

    if let Some(device) = scan_accelerators(&buckets, core, precision.as_str(), false) {
        return Ok(device);
    }
    // FP32 networks may run on FP16-only accelerators at reduced accuracy.
    if precision == Precision::Fp32 {
        if let Some(device) = scan_accelerators(&buckets, core, Precision::Fp16.as_str(), true) {
            return Ok(device);
        }
    }

    match buckets.get(DeviceFamily::Cpu).first() {
        Some(cpu) => {
            info!(device = %cpu, precision = %precision, "no accelerator matched, using CPU");
            Ok(cpu.clone())
        }
        None => Err(Error::NotFound("Cannot select any device".to_string())),
    }
}

fn scan_accelerators(buckets: &DeviceBuckets, core: &dyn DeviceCore, capability: &str, fallback: bool) -> Option<DeviceName> {
    let (family, devices) = buckets.preferred_accelerators()?;
    let found = devices.iter().find(|device| supports(core, device, capability)).cloned();
    if let Some(device) = &found {
        info!(device = %device, family = %family, capability, fallback, "selected accelerator");
    }
    found
}

fn supports(core: &dyn DeviceCore, device: &str, capability: &str) -> bool {
    match core.capabilities(device) {
        Ok(caps) => caps.iter().any(|c| c == capability),
        Err(e) => {
            debug!(device, error = %e, "capability query failed, treating as empty");
            false
        }
    }
}
