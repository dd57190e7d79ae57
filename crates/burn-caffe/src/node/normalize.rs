use crate::blob::{required_tensor, tensor_to_blob};
use crate::caffe::{LayerParameter, NormalizeParameter};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::node::required_weight;
use crate::to_caffe::ExportContext;

/// Configuration for L2 normalization followed by a learned per-channel scale.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeConfig {
    /// Norm order. Always 2 on import.
    pub p: f32,
    pub eps: f32,
    /// Number of scale values, 1 when shared across channels.
    pub channels: usize,
    pub across_spatial: bool,
    pub channel_shared: bool,
}

pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.norm_param.clone().unwrap_or_default();
    let weight = required_tensor(layer, 0)?;
    let channels = weight.shape().first().copied().unwrap_or(1);

    let config = NormalizeConfig {
        p: 2.0,
        eps: param.eps,
        channels,
        across_spatial: param.across_spatial,
        channel_shared: param.channel_shared,
    };
    log::debug!("Normalize {} config: {config:?}", layer.name);

    Ok(Extracted::single(
        Node::new(&layer.name, Operator::Normalize(config))
            .with_inputs(ctx.inputs.clone())
            .with_weight(weight.flatten()),
    ))
}

pub(crate) fn to_caffe(
    node: &Node,
    config: &NormalizeConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    if config.p != 2.0 {
        log::warn!("Normalize {} uses p = {}, exported as L2", node.name, config.p);
    }

    let mut layer = ctx.layer(&node.name, LayerType::Normalize);
    layer.blobs.push(tensor_to_blob(&required_weight(node)?.flatten()));
    layer.norm_param = Some(NormalizeParameter {
        across_spatial: config.across_spatial,
        channel_shared: config.channel_shared,
        eps: config.eps,
    });
    Ok(vec![layer])
}
