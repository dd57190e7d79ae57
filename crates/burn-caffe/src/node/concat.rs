use crate::caffe::{ConcatParameter, LayerParameter};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::to_caffe::ExportContext;

/// Rank assumed when normalizing a negative axis.
const ASSUMED_RANK: i32 = 4;

/// Configuration for concatenation along one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatConfig {
    /// Non-negative concatenation axis.
    pub axis: usize,
}

/// The legacy `concat_dim` wins over `axis` when set; a negative axis counts from the end of
/// an NCHW tensor.
pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.concat_param.clone().unwrap_or_default();
    let declared = match param.concat_dim {
        Some(dim) => dim as i32,
        None => param.axis,
    };
    let axis = if declared < 0 {
        declared + ASSUMED_RANK
    } else {
        declared
    };
    let axis = usize::try_from(axis).map_err(|_| {
        ConvertError::malformed(&layer.name, format!("concat axis {declared} is out of range"))
    })?;

    log::debug!("Concat {} along axis {axis}", layer.name);
    Ok(Extracted::single(
        Node::new(&layer.name, Operator::Concat(ConcatConfig { axis }))
            .with_inputs(ctx.inputs.clone()),
    ))
}

pub(crate) fn to_caffe(
    node: &Node,
    config: &ConcatConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::Concat);
    layer.concat_param = Some(ConcatParameter {
        axis: config.axis as i32,
        concat_dim: None,
    });
    Ok(vec![layer])
}
