use crate::caffe::{LayerParameter, PoolMethod, PoolingParameter, RoundMode};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::node::PairField;
use crate::resolve::resolve_pair;
use crate::to_caffe::ExportContext;

/// Reduction applied over each pooling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolingKind {
    Max,
    Average,
}

/// Configuration for 2D pooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolingConfig {
    pub kind: PoolingKind,
    /// Window `[h, w]`, `[0, 0]` when a global pool declares none.
    pub kernel_size: [usize; 2],
    pub stride: [usize; 2],
    pub padding: [usize; 2],
    /// Pool over the whole spatial extent.
    pub global: bool,
    /// Round the output size up rather than down.
    pub ceil_mode: bool,
}

fn nonzero(value: u32) -> Vec<u32> {
    if value == 0 { Vec::new() } else { vec![value] }
}

pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.pooling_param.clone().unwrap_or_default();

    let kind = match param.pool {
        PoolMethod::Max => PoolingKind::Max,
        PoolMethod::Ave => PoolingKind::Average,
        PoolMethod::Stochastic => {
            return Err(ConvertError::unsupported(format!(
                "{} (stochastic pooling)",
                layer.layer_type
            )));
        }
    };

    let kernel_size = match resolve_pair(param.kernel_h, param.kernel_w, &nonzero(param.kernel_size)) {
        Some(kernel) => kernel,
        None if param.global_pooling => [0, 0],
        None => {
            return Err(ConvertError::malformed(&layer.name, "pooling declares no kernel size"));
        }
    };

    let config = PoolingConfig {
        kind,
        kernel_size,
        stride: resolve_pair(param.stride_h, param.stride_w, &nonzero(param.stride))
            .unwrap_or([1, 1]),
        padding: resolve_pair(param.pad_h, param.pad_w, &[param.pad]).unwrap_or([0, 0]),
        global: param.global_pooling,
        ceil_mode: param.round_mode == RoundMode::Ceil,
    };
    log::debug!("Pooling {} config: {config:?}", layer.name);

    Ok(Extracted::single(
        Node::new(&layer.name, Operator::Pooling(config)).with_inputs(ctx.inputs.clone()),
    ))
}

pub(crate) fn to_caffe(
    node: &Node,
    config: &PoolingConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut param = PoolingParameter {
        pool: match config.kind {
            PoolingKind::Max => PoolMethod::Max,
            PoolingKind::Average => PoolMethod::Ave,
        },
        global_pooling: config.global,
        round_mode: if config.ceil_mode {
            RoundMode::Ceil
        } else {
            RoundMode::Floor
        },
        ..Default::default()
    };

    // A global pool may still declare a window; only the unset [0, 0] is left out.
    if config.kernel_size != [0, 0] {
        match PairField::of(&node.name, "kernel", config.kernel_size) {
            PairField::Shared(k) => param.kernel_size = k,
            PairField::Split(h, w) => (param.kernel_h, param.kernel_w) = (h, w),
        }
    }
    match PairField::of(&node.name, "stride", config.stride) {
        PairField::Shared(s) => param.stride = s,
        PairField::Split(h, w) => (param.stride_h, param.stride_w) = (h, w),
    }
    match PairField::of(&node.name, "padding", config.padding) {
        PairField::Shared(p) => param.pad = p,
        PairField::Split(h, w) => (param.pad_h, param.pad_w) = (h, w),
    }

    let mut layer = ctx.layer(&node.name, LayerType::Pooling);
    layer.pooling_param = Some(param);
    Ok(vec![layer])
}
