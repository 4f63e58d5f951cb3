use autodev_core::types::{Network, OpKind, Precision};

/// Minimum precision a network needs.
///
/// Any FakeQuantize makes it INT8. Otherwise the weights of the first
/// convolution with an f32 or f16 weight type decide; FP32 by default.
pub fn network_precision(network: &Network) -> Precision {
    if network.ops.iter().any(|op| op.kind == OpKind::FakeQuantize) {
        return Precision::Int8;
    }
    network
        .ops
        .iter()
        .filter(|op| op.kind.is_convolution())
        .find_map(|op| match op.weight_type.as_deref() {
            Some("f32") => Some(Precision::Fp32),
            Some("f16") => Some(Precision::Fp16),
            _ => None,
        })
        .unwrap_or(Precision::Fp32)
}
