use std::collections::HashSet;
use std::sync::Arc;

use crate::types::{DeviceName, LoadSource, Network};

/// A network compiled for one device.
pub trait ExecutableNetwork: Send + Sync {
    fn device(&self) -> &str;
}

/// Runtime services the AUTO plugin relies on; implemented by the host.
///
/// Implementations are shared across loader threads, hence `Send + Sync`.
pub trait DeviceCore: Send + Sync {
    fn available_devices(&self) -> anyhow::Result<Vec<DeviceName>>;
    fn capabilities(&self, device: &str) -> anyhow::Result<Vec<String>>;
    fn full_device_name(&self, device: &str) -> anyhow::Result<String>;
    fn load_network(&self, source: &LoadSource, device: &str) -> anyhow::Result<Arc<dyn ExecutableNetwork>>;
    fn query_network(&self, network: &Network, device: &str) -> anyhow::Result<HashSet<String>>;
}
