pub mod device;
pub mod precision;

pub use device::{classify_device, select_device, DeviceBuckets, ACCELERATOR_PRIORITY};
pub use precision::network_precision;
