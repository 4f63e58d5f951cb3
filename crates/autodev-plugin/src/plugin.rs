use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use autodev_core::config::{merge_configs, AUTO_KEY_PREFIX, KEY_AUTO_DEVICE_LIST, KEY_PERF_COUNT, NO, YES};
use autodev_core::device_list::parse_device_list;
use autodev_core::error::{Error, Result};
use autodev_core::traits::DeviceCore;
use autodev_core::types::{ConfigMap, DeviceName, LoadSource, MetricValue, Network, Precision};
use autodev_select::{network_precision, select_device};
use tracing::{debug, info};

use crate::executable::{AutoExecutableNetwork, PendingLoad};
use crate::{
    FULL_DEVICE_NAME, METRIC_FULL_DEVICE_NAME, METRIC_OPTIMIZATION_CAPABILITIES, METRIC_SUPPORTED_CONFIG_KEYS,
    METRIC_SUPPORTED_METRICS, PLUGIN_NAME,
};

/// Devices probed for optimization capabilities when no list is configured.
const DEFAULT_CAPABILITY_DEVICES: [&str; 2] = ["CPU", "GPU"];

pub struct AutoPlugin {
    core: Arc<dyn DeviceCore>,
    config: ConfigMap,
}

impl AutoPlugin {
    pub fn new(core: Arc<dyn DeviceCore>) -> Self {
        Self { core, config: ConfigMap::new() }
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    /// Store `config`, entry by entry. Entries before the first invalid one
    /// stay stored.
    pub fn set_config(&mut self, config: &ConfigMap) -> Result<()> {
        for (key, value) in config {
            check_entry(key, value)?;
            self.config.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<String> {
        self.config.get(key).cloned().ok_or_else(|| Error::UnsupportedConfigKey(key.to_string()))
    }

    pub fn check_config(config: &ConfigMap) -> Result<()> {
        config.iter().try_for_each(|(key, value)| check_entry(key, value))
    }

    /// Candidate devices: `AUTO_DEVICE_LIST` from `config` when present,
    /// everything the core reports otherwise.
    pub fn device_list(&self, config: &ConfigMap) -> Result<Vec<DeviceName>> {
        let devices = match config.get(KEY_AUTO_DEVICE_LIST) {
            Some(list) => parse_device_list(list),
            None => self.core.available_devices().map_err(|e| Error::Operation(e.to_string()))?,
        };
        if devices.is_empty() {
            return Err(Error::NotFound("Please, check environment due to no supported devices can be used".to_string()));
        }
        Ok(devices)
    }

    pub fn get_metric(&self, name: &str, options: &ConfigMap) -> Result<MetricValue> {
        match name {
            METRIC_SUPPORTED_METRICS => Ok(MetricValue::List(
                [
                    METRIC_SUPPORTED_METRICS,
                    METRIC_FULL_DEVICE_NAME,
                    METRIC_SUPPORTED_CONFIG_KEYS,
                    METRIC_OPTIMIZATION_CAPABILITIES,
                ]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            )),
            METRIC_FULL_DEVICE_NAME => Ok(MetricValue::Text(FULL_DEVICE_NAME.to_string())),
            METRIC_SUPPORTED_CONFIG_KEYS => {
                Ok(MetricValue::List(vec![KEY_AUTO_DEVICE_LIST.to_string(), KEY_PERF_COUNT.to_string()]))
            }
            METRIC_OPTIMIZATION_CAPABILITIES => Ok(MetricValue::List(self.optimization_capabilities(options))),
            other => Err(Error::UnsupportedMetric(other.to_string())),
        }
    }

    /// Union of the capabilities of the configured devices, sorted. Devices
    /// that fail to answer contribute nothing.
    fn optimization_capabilities(&self, options: &ConfigMap) -> Vec<String> {
        let devices = match options.get(KEY_AUTO_DEVICE_LIST).or_else(|| self.config.get(KEY_AUTO_DEVICE_LIST)) {
            Some(list) => parse_device_list(list),
            None => DEFAULT_CAPABILITY_DEVICES.iter().map(|d| d.to_string()).collect(),
        };
        let mut capabilities = BTreeSet::new();
        for device in &devices {
            match self.core.capabilities(device) {
                Ok(caps) => capabilities.extend(caps),
                Err(e) => debug!(device = %device, error = %e, "skipping device without capabilities"),
            }
        }
        capabilities.into_iter().collect()
    }

    /// Layers the AUTO device can run, each mapped to the plugin name. The
    /// first device able to answer decides.
    pub fn query_network(&self, network: &Network, config: &ConfigMap) -> Result<BTreeMap<String, String>> {
        let full = merge_configs(self.config.clone(), config);
        let devices = self.device_list(&full)?;
        let mut supported = HashSet::new();
        for device in &devices {
            match self.core.query_network(network, device) {
                Ok(layers) => {
                    debug!(device = %device, layers = layers.len(), "query answered");
                    supported = layers;
                    break;
                }
                Err(e) => debug!(device = %device, error = %e, "query failed, trying next device"),
            }
        }
        Ok(supported.into_iter().map(|layer| (layer, PLUGIN_NAME.to_string())).collect())
    }

    /// The device a network of `precision` would be dispatched to, chosen
    /// from the stored config overlaid with `config`.
    pub fn select(&self, precision: Precision, config: &ConfigMap) -> Result<DeviceName> {
        let full = merge_configs(self.config.clone(), config);
        let devices = self.device_list(&full)?;
        select_device(&devices, precision, &*self.core)
    }

    /// Start loading `source` on the first CPU device and on the selected
    /// accelerator. Returns as soon as both loads are under way.
    pub async fn load_network(&self, source: LoadSource, config: &ConfigMap) -> Result<AutoExecutableNetwork> {
        let full = merge_configs(self.config.clone(), config);
        Self::check_config(&full)?;
        let devices = self.device_list(&full)?;

        let precision = match &source {
            LoadSource::Network(network) => network_precision(network),
            LoadSource::Path(_) => Precision::Fp32,
        };
        // No load starts until selection has succeeded.
        let selected = select_device(&devices, precision, &*self.core)?;
        info!(device = %selected, precision = %precision, "AUTO selected device");
        let source = Arc::new(source);

        let cpu = devices
            .iter()
            .find(|d| d.contains("CPU"))
            .map(|d| PendingLoad::spawn(self.core.clone(), source.clone(), d.clone()));
        let accelerator = if selected.contains("CPU") {
            None
        } else {
            Some(PendingLoad::spawn(self.core.clone(), source, selected))
        };

        let perf_count = full.contains_key(KEY_PERF_COUNT);
        Ok(AutoExecutableNetwork::new(cpu, accelerator, perf_count))
    }
}

fn check_entry(key: &str, value: &str) -> Result<()> {
    if key.starts_with(AUTO_KEY_PREFIX) {
        Ok(())
    } else if key == KEY_PERF_COUNT {
        if value == YES || value == NO {
            Ok(())
        } else {
            Err(Error::UnsupportedConfigValue { key: key.to_string(), value: value.to_string() })
        }
    } else {
        Err(Error::UnsupportedConfigKey(key.to_string()))
    }
}
