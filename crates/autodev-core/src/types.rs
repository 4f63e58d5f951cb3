//! Domain types shared by the selector, the plugin and the CLI.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Opaque device identifier such as `"CPU"`, `"GPU.0"` or `"MYRIAD"`.
pub type DeviceName = String;

/// Plugin configuration: string keys to string values.
pub type ConfigMap = BTreeMap<String, String>;

/// Minimum numeric precision a workload needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Precision {
    #[serde(rename = "INT8")]
    Int8,
    #[serde(rename = "FP16")]
    Fp16,
    #[serde(rename = "FP32")]
    Fp32,
}

impl Precision {
    /// The capability label devices report for this precision.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int8 => "INT8",
            Self::Fp16 => "FP16",
            Self::Fp32 => "FP32",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Precision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INT8" => Ok(Self::Int8),
            "FP16" => Ok(Self::Fp16),
            "FP32" => Ok(Self::Fp32),
            other => Err(Error::InvalidConfig(format!("unknown precision label: {}", other))),
        }
    }
}

/// Family bucket a device is sorted into before selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceFamily {
    Cpu,
    DGpu,
    IGpu,
    Myriad,
    Vpux,
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cpu => "CPU",
            Self::DGpu => "dGPU",
            Self::IGpu => "iGPU",
            Self::Myriad => "MYRIAD",
            Self::Vpux => "VPUX",
        };
        f.write_str(s)
    }
}

/// Operation kinds the precision classifier cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    FakeQuantize,
    Convolution,
    GroupConvolution,
    ConvolutionBackpropData,
    GroupConvolutionBackpropData,
    ConvolutionIe,
    DeconvolutionIe,
    Other(String),
}

impl OpKind {
    pub fn is_convolution(&self) -> bool {
        matches!(
            self,
            Self::Convolution
                | Self::GroupConvolution
                | Self::ConvolutionBackpropData
                | Self::GroupConvolutionBackpropData
                | Self::ConvolutionIe
                | Self::DeconvolutionIe
        )
    }
}

/// A single operation of a network graph.
///
/// `weight_type` is the element type of the op's second input (`"f32"`,
/// `"f16"`, ...), when the op has one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkOp {
    pub name: String,
    pub kind: OpKind,
    #[serde(default)]
    pub weight_type: Option<String>,
}

/// Ordered description of a network graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    #[serde(default)]
    pub ops: Vec<NetworkOp>,
}

impl Network {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ops: Vec::new() }
    }

    pub fn with_op(mut self, name: impl Into<String>, kind: OpKind, weight_type: Option<&str>) -> Self {
        self.ops.push(NetworkOp { name: name.into(), kind, weight_type: weight_type.map(str::to_string) });
        self
    }
}

/// What a device is asked to load.
#[derive(Debug, Clone)]
pub enum LoadSource {
    Path(PathBuf),
    Network(Network),
}

/// Value returned by a metric query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Text(String),
    List(Vec<String>),
}
