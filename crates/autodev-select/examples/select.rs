use autodev_core::inventory::{DeviceEntry, Inventory, InventoryCore};
use autodev_core::traits::DeviceCore;
use autodev_core::types::Precision;
use autodev_select::select_device;

fn main() -> anyhow::Result<()> {
    let inventory = Inventory::default()
        .with_device(DeviceEntry::new("CPU", "Intel(R) Core(TM) i7", &["FP32", "INT8"]))
        .with_device(DeviceEntry::new("GPU.0", "Intel(R) Iris(R) Xe Graphics (iGPU)", &["FP32", "FP16", "INT8"]))
        .with_device(DeviceEntry::new("MYRIAD", "Intel Movidius Myriad X VPU", &["FP16"]));
    let core = InventoryCore::new(inventory);
    let devices = core.available_devices()?;
    for precision in [Precision::Int8, Precision::Fp16, Precision::Fp32] {
        println!("{} -> {}", precision, select_device(&devices, precision, &core)?);
    }
    Ok(())
}
