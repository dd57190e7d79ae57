use crate::caffe::{LayerParameter, LrnParameter, NormRegion};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::to_caffe::ExportContext;

/// Configuration for local response normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct LrnConfig {
    /// Number of channels (or side of the square window) summed over.
    pub size: usize,
    pub alpha: f32,
    pub beta: f32,
    pub k: f32,
    /// Normalize over a spatial window within each channel instead of across channels.
    pub within_channel: bool,
}

pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.lrn_param.clone().unwrap_or_default();
    if param.local_size % 2 == 0 {
        return Err(ConvertError::malformed(
            &layer.name,
            format!("local size {} must be odd", param.local_size),
        ));
    }

    let config = LrnConfig {
        size: param.local_size as usize,
        alpha: param.alpha,
        beta: param.beta,
        k: param.k,
        within_channel: param.norm_region == NormRegion::WithinChannel,
    };
    log::debug!("LRN {} config: {config:?}", layer.name);

    Ok(Extracted::single(
        Node::new(&layer.name, Operator::Lrn(config)).with_inputs(ctx.inputs.clone()),
    ))
}

pub(crate) fn to_caffe(
    node: &Node,
    config: &LrnConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::Lrn);
    layer.lrn_param = Some(LrnParameter {
        local_size: config.size as u32,
        alpha: config.alpha,
        beta: config.beta,
        norm_region: if config.within_channel {
            NormRegion::WithinChannel
        } else {
            NormRegion::AcrossChannels
        },
        k: config.k,
    });
    Ok(vec![layer])
}
