//! The AUTO virtual device: picks an accelerator for a network and loads it
//! there while a CPU copy comes up in parallel.

pub mod executable;
pub mod plugin;

pub use executable::AutoExecutableNetwork;
pub use plugin::AutoPlugin;

pub const PLUGIN_NAME: &str = "AUTO";
pub const FULL_DEVICE_NAME: &str = "Inference Engine AUTO device";

pub const METRIC_SUPPORTED_METRICS: &str = "SUPPORTED_METRICS";
pub const METRIC_FULL_DEVICE_NAME: &str = "FULL_DEVICE_NAME";
pub const METRIC_SUPPORTED_CONFIG_KEYS: &str = "SUPPORTED_CONFIG_KEYS";
pub const METRIC_OPTIMIZATION_CAPABILITIES: &str = "OPTIMIZATION_CAPABILITIES";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
    pub description: &'static str,
}

pub const VERSION: PluginVersion = PluginVersion { major: 2, minor: 1, description: "AutoPlugin" };
