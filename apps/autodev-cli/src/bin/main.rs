use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use autodev_core::config::{resolve_with_base, Config};
use autodev_core::inventory::{Inventory, InventoryCore};
use autodev_core::traits::DeviceCore;
use autodev_core::types::{ConfigMap, LoadSource, Network, Precision};
use autodev_plugin::{AutoPlugin, VERSION};
use autodev_select::{classify_device, network_precision};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "<devices|select|metric|load|version> [--inventory devices.toml] [--network net.json] [args...]";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() { eprintln!("Usage: {} {}", prog, USAGE); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

/// Remove `flag <value>` from `args`, returning the value.
fn take_flag(args: &mut Vec<String>, flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    if pos + 1 >= args.len() { eprintln!("Missing value for {}", flag); std::process::exit(1); }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Some(value)
}

fn read_network(path: &Path) -> anyhow::Result<Network> {
    let text = fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Failed to read network {}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("Invalid network description {}: {}", path.display(), e))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let (cmd, mut args) = parse_args();
    if cmd == "version" {
        println!("{} {}.{}", VERSION.description, VERSION.major, VERSION.minor);
        return Ok(());
    }

    let cwd = env::current_dir()?;
    let inventory_path: PathBuf = match take_flag(&mut args, "--inventory") {
        Some(p) => resolve_with_base(&cwd, p),
        None => resolve_with_base(&cwd, config.get::<String>("inventory.path").unwrap_or_else(|_| "devices.toml".to_string())),
    };
    let network = take_flag(&mut args, "--network").map(|p| read_network(&resolve_with_base(&cwd, p))).transpose()?;

    let core = Arc::new(InventoryCore::new(Inventory::from_toml_file(&inventory_path)?));
    let mut plugin = AutoPlugin::new(core.clone());
    plugin.set_config(&config.plugin_config()?)?;

    match cmd.as_str() {
        "devices" => {
            println!("📦 Inventory: {}", inventory_path.display());
            for device in core.available_devices()? {
                let family = classify_device(&device, &*core).map_or_else(|| "-".to_string(), |f| f.to_string());
                let full_name = core.full_device_name(&device).unwrap_or_default();
                let caps = core.capabilities(&device).map(|c| c.join(",")).unwrap_or_else(|_| "?".to_string());
                println!("  {:<12} {:<7} [{}]  {}", device, family, caps, full_name);
            }
        }
        "select" => {
            let precision: Precision = match (&network, args.first()) {
                (Some(net), _) => network_precision(net),
                (None, Some(label)) => label.parse()?,
                (None, None) => Precision::Fp32,
            };
            let device = plugin.select(precision, &ConfigMap::new())?;
            println!("🎯 {} network -> {}", precision, device);
        }
        "metric" => {
            let name = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: autodev metric <NAME>"); std::process::exit(1)
            });
            let value = plugin.get_metric(&name, &ConfigMap::new())?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        "load" => {
            let source = match network {
                Some(net) => LoadSource::Network(net),
                None => LoadSource::Path(args.first().map(PathBuf::from).unwrap_or_else(|| {
                    eprintln!("Usage: autodev load <model-path> | --network net.json"); std::process::exit(1)
                })),
            };
            let ready = tokio::runtime::Runtime::new()?.block_on(async {
                let exec = plugin.load_network(source, &ConfigMap::new()).await?;
                println!(
                    "🚀 Loading on cpu={} accelerator={} (perf count: {})",
                    exec.cpu_device().unwrap_or("-"),
                    exec.accelerator_device().unwrap_or("-"),
                    exec.perf_count_enabled()
                );
                exec.wait_any().await
            })?;
            println!("✅ Network ready on {}", ready.device());
        }
        _ => { eprintln!("Unknown command: {}", cmd); std::process::exit(1); }
    }
    Ok(())
}
