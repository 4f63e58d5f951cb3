//! A [`DeviceCore`] backed by a static device inventory.
//!
//! The inventory is read from TOML:
//!
//! ```toml
//! [[devices]]
//! name = "GPU.0"
//! full_name = "Intel(R) Iris(R) Xe Graphics (iGPU)"
//! capabilities = ["FP32", "FP16", "INT8"]
//! supported_layers = ["conv1", "relu1"]
//! ```
//!
//! `fail_capabilities`, `fail_name` and `fail_load` make the matching query
//! fail, and `load_delay_ms` slows a load down.
use anyhow::{anyhow, Result};
use figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::traits::{DeviceCore, ExecutableNetwork};
use crate::types::{DeviceName, LoadSource, Network};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub name: DeviceName,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub supported_layers: Option<Vec<String>>,
    #[serde(default)]
    pub fail_capabilities: bool,
    #[serde(default)]
    pub fail_name: bool,
    #[serde(default)]
    pub fail_load: bool,
    #[serde(default)]
    pub load_delay_ms: u64,
}

impl DeviceEntry {
    pub fn new(name: &str, full_name: &str, capabilities: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            full_name: full_name.to_string(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

impl Inventory {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!("Inventory file not found: {}", path.display()));
        }
        Figment::from(Toml::file(path))
            .extract()
            .map_err(|e| anyhow!("Failed to read inventory {}: {}", path.display(), e))
    }

    pub fn with_device(mut self, entry: DeviceEntry) -> Self {
        self.devices.push(entry);
        self
    }
}

/// Network "compiled" by [`InventoryCore`].
#[derive(Debug, Clone)]
pub struct LoadedNetwork {
    pub device: DeviceName,
    pub network: String,
}

impl ExecutableNetwork for LoadedNetwork {
    fn device(&self) -> &str {
        &self.device
    }
}

pub struct InventoryCore {
    inventory: Inventory,
    loads: Mutex<Vec<DeviceName>>,
}

impl InventoryCore {
    pub fn new(inventory: Inventory) -> Self {
        Self { inventory, loads: Mutex::new(Vec::new()) }
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Devices a load was requested on, in request order.
    pub fn load_requests(&self) -> Vec<DeviceName> {
        self.loads.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn entry(&self, device: &str) -> Result<&DeviceEntry> {
        self.inventory
            .devices
            .iter()
            .find(|d| d.name == device)
            .ok_or_else(|| anyhow!("Unknown device: {}", device))
    }
}

impl DeviceCore for InventoryCore {
    fn available_devices(&self) -> Result<Vec<DeviceName>> {
        Ok(self.inventory.devices.iter().map(|d| d.name.clone()).collect())
    }

    fn capabilities(&self, device: &str) -> Result<Vec<String>> {
        let entry = self.entry(device)?;
        if entry.fail_capabilities {
            return Err(anyhow!("{}: OPTIMIZATION_CAPABILITIES query failed", device));
        }
        Ok(entry.capabilities.clone())
    }

    fn full_device_name(&self, device: &str) -> Result<String> {
        let entry = self.entry(device)?;
        if entry.fail_name {
            return Err(anyhow!("{}: FULL_DEVICE_NAME query failed", device));
        }
        Ok(entry.full_name.clone())
    }

    fn load_network(&self, source: &LoadSource, device: &str) -> Result<Arc<dyn ExecutableNetwork>> {
        self.loads.lock().unwrap_or_else(|e| e.into_inner()).push(device.to_string());
        let entry = self.entry(device)?;
        if entry.load_delay_ms > 0 {
            thread::sleep(Duration::from_millis(entry.load_delay_ms));
        }
        if entry.fail_load {
            return Err(anyhow!("{}: failed to load network", device));
        }
        let network = match source {
            LoadSource::Path(path) => path.display().to_string(),
            LoadSource::Network(net) => net.name.clone(),
        };
        Ok(Arc::new(LoadedNetwork { device: device.to_string(), network }))
    }

    fn query_network(&self, network: &Network, device: &str) -> Result<HashSet<String>> {
        let entry = self.entry(device)?;
        let layers = entry
            .supported_layers
            .as_ref()
            .ok_or_else(|| anyhow!("{}: QueryNetwork is not supported", device))?;
        Ok(network.ops.iter().map(|op| op.name.clone()).filter(|name| layers.contains(name)).collect())
    }
}
