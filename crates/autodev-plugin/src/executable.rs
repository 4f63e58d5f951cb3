use std::fmt;
use std::sync::Arc;

use autodev_core::error::{Error, Result};
use autodev_core::traits::{DeviceCore, ExecutableNetwork};
use autodev_core::types::{DeviceName, LoadSource};
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};

type LoadOutcome = std::result::Result<Arc<dyn ExecutableNetwork>, String>;

/// A network load running on a blocking worker thread.
pub(crate) struct PendingLoad {
    device: DeviceName,
    handle: JoinHandle<anyhow::Result<Arc<dyn ExecutableNetwork>>>,
}

impl PendingLoad {
    pub(crate) fn spawn(core: Arc<dyn DeviceCore>, source: Arc<LoadSource>, device: DeviceName) -> Self {
        info!(device = %device, "starting network load");
        let target = device.clone();
        let handle = tokio::task::spawn_blocking(move || core.load_network(&source, &target));
        Self { device, handle }
    }

    async fn finish(self) -> LoadOutcome {
        let joined = self.handle.await;
        settle(&self.device, joined)
    }
}

fn settle(device: &str, joined: std::result::Result<anyhow::Result<Arc<dyn ExecutableNetwork>>, JoinError>) -> LoadOutcome {
    match joined {
        Ok(Ok(network)) => {
            info!(device, "network loaded");
            Ok(network)
        }
        Ok(Err(e)) => {
            warn!(device, error = %e, "network load failed");
            Err(format!("{}: {}", device, e))
        }
        Err(e) => {
            warn!(device, error = %e, "network load task aborted");
            Err(format!("{}: load task aborted: {}", device, e))
        }
    }
}

/// Both halves of an AUTO load: the CPU copy and the accelerator copy.
/// Either may be absent.
pub struct AutoExecutableNetwork {
    cpu: Option<PendingLoad>,
    accelerator: Option<PendingLoad>,
    perf_count: bool,
}

impl AutoExecutableNetwork {
    pub(crate) fn new(cpu: Option<PendingLoad>, accelerator: Option<PendingLoad>, perf_count: bool) -> Self {
        Self { cpu, accelerator, perf_count }
    }

    pub fn cpu_device(&self) -> Option<&str> {
        self.cpu.as_ref().map(|l| l.device.as_str())
    }

    pub fn accelerator_device(&self) -> Option<&str> {
        self.accelerator.as_ref().map(|l| l.device.as_str())
    }

    pub fn perf_count_enabled(&self) -> bool {
        self.perf_count
    }

    /// The first network that finishes loading successfully. When both are
    /// ready at once the accelerator wins.
    pub async fn wait_any(self) -> Result<Arc<dyn ExecutableNetwork>> {
        match (self.cpu, self.accelerator) {
            (None, None) => Err(Error::Operation("no network load was started".to_string())),
            (Some(only), None) | (None, Some(only)) => only.finish().await.map_err(Error::Operation),
            (Some(cpu), Some(accelerator)) => {
                let PendingLoad { device: cpu_device, handle: mut cpu_handle } = cpu;
                let PendingLoad { device: acc_device, handle: mut acc_handle } = accelerator;
                tokio::select! {
                    biased;
                    joined = &mut acc_handle => match settle(&acc_device, joined) {
                        Ok(network) => Ok(network),
                        Err(first) => settle(&cpu_device, cpu_handle.await).map_err(|second| both_failed(&first, &second)),
                    },
                    joined = &mut cpu_handle => match settle(&cpu_device, joined) {
                        Ok(network) => Ok(network),
                        Err(first) => settle(&acc_device, acc_handle.await).map_err(|second| both_failed(&first, &second)),
                    },
                }
            }
        }
    }

    /// The accelerator network, or the CPU network when there is no
    /// accelerator or it failed to load.
    pub async fn wait_accelerator(self) -> Result<Arc<dyn ExecutableNetwork>> {
        let mut failure = None;
        if let Some(accelerator) = self.accelerator {
            match accelerator.finish().await {
                Ok(network) => return Ok(network),
                Err(e) => failure = Some(e),
            }
        }
        match (self.cpu, failure) {
            (Some(cpu), None) => cpu.finish().await.map_err(Error::Operation),
            (Some(cpu), Some(first)) => cpu.finish().await.map_err(|second| both_failed(&first, &second)),
            (None, Some(first)) => Err(Error::Operation(first)),
            (None, None) => Err(Error::Operation("no network load was started".to_string())),
        }
    }
}

impl fmt::Debug for AutoExecutableNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoExecutableNetwork")
            .field("cpu", &self.cpu_device())
            .field("accelerator", &self.accelerator_device())
            .field("perf_count", &self.perf_count)
            .finish()
    }
}

fn both_failed(first: &str, second: &str) -> Error {
    Error::Operation(format!("all network loads failed: {}; {}", first, second))
}
