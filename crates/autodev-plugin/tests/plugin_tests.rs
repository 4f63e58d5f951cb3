use std::sync::Arc;

use autodev_core::error::Error;
use autodev_core::inventory::{DeviceEntry, Inventory, InventoryCore};
use autodev_core::types::{ConfigMap, LoadSource, MetricValue, Network, OpKind, Precision};
use autodev_plugin::{AutoPlugin, FULL_DEVICE_NAME, PLUGIN_NAME};

const DGPU: &str = "Intel(R) Arc(TM) A770 Graphics (dGPU)";

fn plugin_with(entries: Vec<DeviceEntry>) -> (AutoPlugin, Arc<InventoryCore>) {
    let core = Arc::new(InventoryCore::new(entries.into_iter().fold(Inventory::default(), Inventory::with_device)));
    (AutoPlugin::new(core.clone()), core)
}

fn cpu() -> DeviceEntry {
    DeviceEntry::new("CPU", "Intel(R) Core(TM) i9", &["FP32", "INT8"])
}

fn gpu() -> DeviceEntry {
    DeviceEntry::new("GPU.0", DGPU, &["FP32", "FP16"])
}

fn config(pairs: &[(&str, &str)]) -> ConfigMap {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn conv_net() -> Network {
    Network::new("resnet").with_op("conv1", OpKind::Convolution, Some("f32")).with_op("relu1", OpKind::Other("Relu".into()), None)
}

#[test]
fn set_config_accepts_auto_keys_and_perf_count() {
    let (mut plugin, _) = plugin_with(vec![cpu()]);
    plugin.set_config(&config(&[("AUTO_DEVICE_LIST", "GPU.0,CPU"), ("PERF_COUNT", "YES")])).unwrap();
    assert_eq!(plugin.get_config("AUTO_DEVICE_LIST").unwrap(), "GPU.0,CPU");
    assert_eq!(plugin.get_config("PERF_COUNT").unwrap(), "YES");
    assert_eq!(plugin.name(), PLUGIN_NAME);
}

#[test]
fn set_config_rejects_unknown_keys_and_values() {
    let (mut plugin, _) = plugin_with(vec![cpu()]);
    let err = plugin.set_config(&config(&[("CPU_THREADS_NUM", "4")])).unwrap_err();
    assert!(matches!(err, Error::UnsupportedConfigKey(k) if k == "CPU_THREADS_NUM"));

    let err = plugin.set_config(&config(&[("PERF_COUNT", "maybe")])).unwrap_err();
    assert!(matches!(err, Error::UnsupportedConfigValue { .. }));

    assert!(matches!(plugin.get_config("PERF_COUNT"), Err(Error::UnsupportedConfigKey(_))));
}

#[test]
fn device_list_prefers_configured_list() {
    let (plugin, _) = plugin_with(vec![cpu(), gpu()]);
    assert_eq!(plugin.device_list(&ConfigMap::new()).unwrap(), vec!["CPU", "GPU.0"]);
    assert_eq!(plugin.device_list(&config(&[("AUTO_DEVICE_LIST", "MYRIAD, CPU")])).unwrap(), vec!["MYRIAD", "CPU"]);
    let err = plugin.device_list(&config(&[("AUTO_DEVICE_LIST", " ")])).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn metrics() {
    let (plugin, _) = plugin_with(vec![cpu(), gpu()]);
    let none = ConfigMap::new();

    assert_eq!(plugin.get_metric("FULL_DEVICE_NAME", &none).unwrap(), MetricValue::Text(FULL_DEVICE_NAME.to_string()));
    match plugin.get_metric("SUPPORTED_METRICS", &none).unwrap() {
        MetricValue::List(list) => assert_eq!(list.len(), 4),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        plugin.get_metric("SUPPORTED_CONFIG_KEYS", &none).unwrap(),
        MetricValue::List(vec!["AUTO_DEVICE_LIST".into(), "PERF_COUNT".into()])
    );
    assert!(matches!(plugin.get_metric("RANGE_FOR_STREAMS", &none), Err(Error::UnsupportedMetric(_))));
}

#[test]
fn optimization_capabilities_union_skips_failures() {
    // Default probe list is CPU and GPU; "GPU" is not in the inventory and fails.
    let (plugin, _) = plugin_with(vec![cpu(), gpu()]);
    assert_eq!(
        plugin.get_metric("OPTIMIZATION_CAPABILITIES", &ConfigMap::new()).unwrap(),
        MetricValue::List(vec!["FP32".into(), "INT8".into()])
    );
    assert_eq!(
        plugin.get_metric("OPTIMIZATION_CAPABILITIES", &config(&[("AUTO_DEVICE_LIST", "CPU,GPU.0")])).unwrap(),
        MetricValue::List(vec!["FP16".into(), "FP32".into(), "INT8".into()])
    );
}

#[test]
fn query_network_uses_first_answering_device() {
    let mut gpu = gpu();
    gpu.supported_layers = Some(vec!["conv1".into()]);
    let mut cpu = cpu();
    cpu.supported_layers = Some(vec!["conv1".into(), "relu1".into()]);
    let (plugin, _) = plugin_with(vec![DeviceEntry::new("MYRIAD", "Myriad X", &["FP16"]), gpu, cpu]);

    let result = plugin.query_network(&conv_net(), &config(&[("AUTO_DEVICE_LIST", "MYRIAD,GPU.0,CPU")])).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result["conv1"], "AUTO");
}

#[tokio::test]
async fn load_starts_cpu_and_accelerator() {
    let (plugin, core) = plugin_with(vec![cpu(), gpu()]);
    let exec = plugin.load_network(LoadSource::Network(conv_net()), &config(&[("PERF_COUNT", "NO")])).await.unwrap();
    assert_eq!(exec.cpu_device(), Some("CPU"));
    assert_eq!(exec.accelerator_device(), Some("GPU.0"));
    assert!(exec.perf_count_enabled());

    let network = exec.wait_accelerator().await.unwrap();
    assert_eq!(network.device(), "GPU.0");
    let mut requested = core.load_requests();
    requested.sort();
    assert_eq!(requested, vec!["CPU", "GPU.0"]);
}

#[tokio::test]
async fn cpu_selection_does_not_start_a_second_task() {
    let (plugin, _) = plugin_with(vec![cpu(), DeviceEntry::new("MYRIAD", "Myriad X", &["FP16"])]);
    let int8 = Network::new("q").with_op("fq", OpKind::FakeQuantize, None);
    let exec = plugin.load_network(LoadSource::Network(int8), &ConfigMap::new()).await.unwrap();
    assert_eq!(exec.cpu_device(), Some("CPU"));
    assert_eq!(exec.accelerator_device(), None);
    assert!(!exec.perf_count_enabled());
    assert_eq!(exec.wait_any().await.unwrap().device(), "CPU");
}

#[tokio::test]
async fn failed_accelerator_falls_back_to_cpu() {
    let mut gpu = gpu();
    gpu.fail_load = true;
    let (plugin, _) = plugin_with(vec![cpu(), gpu]);
    let exec = plugin.load_network(LoadSource::Path("model.xml".into()), &ConfigMap::new()).await.unwrap();
    assert_eq!(exec.accelerator_device(), Some("GPU.0"));
    assert_eq!(exec.wait_accelerator().await.unwrap().device(), "CPU");
}

#[tokio::test]
async fn wait_any_returns_the_faster_load() {
    let mut gpu = gpu();
    gpu.load_delay_ms = 300;
    let (plugin, _) = plugin_with(vec![cpu(), gpu]);
    let exec = plugin.load_network(LoadSource::Path("model.xml".into()), &ConfigMap::new()).await.unwrap();
    assert_eq!(exec.wait_any().await.unwrap().device(), "CPU");
}

#[tokio::test]
async fn wait_any_skips_a_failed_load() {
    let mut cpu = cpu();
    cpu.fail_load = true;
    let mut gpu = gpu();
    gpu.load_delay_ms = 50;
    let (plugin, _) = plugin_with(vec![cpu, gpu]);
    let exec = plugin.load_network(LoadSource::Path("model.xml".into()), &ConfigMap::new()).await.unwrap();
    assert_eq!(exec.wait_any().await.unwrap().device(), "GPU.0");
}

#[tokio::test]
async fn both_loads_failing_is_an_error() {
    let mut cpu = cpu();
    cpu.fail_load = true;
    let mut gpu = gpu();
    gpu.fail_load = true;
    let (plugin, _) = plugin_with(vec![cpu, gpu]);
    let exec = plugin.load_network(LoadSource::Path("model.xml".into()), &ConfigMap::new()).await.unwrap();
    assert!(matches!(exec.wait_any().await, Err(Error::Operation(_))));
}

#[tokio::test]
async fn load_rejects_bad_config_and_unselectable_devices() {
    let (plugin, _) = plugin_with(vec![cpu(), gpu()]);
    let err = plugin.load_network(LoadSource::Path("m.xml".into()), &config(&[("PERF_COUNT", "1")])).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedConfigValue { .. }));

    let err = plugin
        .load_network(LoadSource::Path("m.xml".into()), &config(&[("AUTO_DEVICE_LIST", "HDDL,FPGA")]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn select_honours_stored_device_list() {
    let myriad = DeviceEntry::new("MYRIAD", "Myriad X", &["FP16"]);
    let (mut plugin, _) = plugin_with(vec![cpu(), gpu(), myriad]);
    assert_eq!(plugin.select(Precision::Fp16, &ConfigMap::new()).unwrap(), "GPU.0");

    plugin.set_config(&config(&[("AUTO_DEVICE_LIST", "MYRIAD,CPU")])).unwrap();
    assert_eq!(plugin.select(Precision::Fp16, &ConfigMap::new()).unwrap(), "MYRIAD");
    assert_eq!(plugin.select(Precision::Fp16, &config(&[("AUTO_DEVICE_LIST", "CPU,GPU.0")])).unwrap(), "GPU.0");
}

#[tokio::test]
async fn failed_selection_starts_no_load() {
    let (plugin, core) = plugin_with(vec![cpu()]);
    let err = plugin
        .load_network(LoadSource::Path("m.xml".into()), &config(&[("AUTO_DEVICE_LIST", "MY_CPU,HDDL")]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(core.load_requests().is_empty());
}
