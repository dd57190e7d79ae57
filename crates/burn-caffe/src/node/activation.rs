//! Element-wise activations and softmax.

use crate::blob::{required_tensor, tensor_to_blob};
use crate::caffe::{
    EluParameter, LayerParameter, PReluParameter, PowerParameter, ReluParameter,
    SoftmaxParameter, ThresholdParameter,
};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::node::required_weight;
use crate::to_caffe::ExportContext;

/// Configuration for (leaky) rectified linear units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReluConfig {
    /// Slope applied to negative inputs, 0 for a plain ReLU.
    pub negative_slope: f32,
}

/// `(shift + scale * x) ^ power`
#[derive(Debug, Clone, PartialEq)]
pub struct PowerConfig {
    pub power: f32,
    pub scale: f32,
    pub shift: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EluConfig {
    pub alpha: f32,
}

/// Configuration for parametric ReLU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PReluConfig {
    /// Number of learned slopes.
    pub num_parameters: usize,
    /// Whether one slope is shared by every channel.
    pub channel_shared: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdConfig {
    pub threshold: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftmaxConfig {
    /// Axis the softmax is taken over.
    pub axis: i32,
}

fn single(layer: &LayerParameter, ctx: &ImportContext, op: Operator) -> Extracted {
    log::debug!("{} {} mapped to {}", layer.layer_type, layer.name, op.kind());
    Extracted::single(Node::new(&layer.name, op).with_inputs(ctx.inputs.clone()))
}

/// Activations without parameters.
pub(crate) fn plain_from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
    op: Operator,
) -> Result<Extracted, ConvertError> {
    Ok(single(layer, ctx, op))
}

pub(crate) fn plain_to_caffe(
    node: &Node,
    ctx: &ExportContext,
    layer_type: LayerType,
) -> Result<Vec<LayerParameter>, ConvertError> {
    Ok(vec![ctx.layer(&node.name, layer_type)])
}

pub(crate) fn relu_from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.relu_param.clone().unwrap_or_default();
    let config = ReluConfig {
        negative_slope: param.negative_slope,
    };
    Ok(single(layer, ctx, Operator::Relu(config)))
}

pub(crate) fn relu_to_caffe(
    node: &Node,
    config: &ReluConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::Relu);
    if config.negative_slope != 0.0 {
        layer.relu_param = Some(ReluParameter {
            negative_slope: config.negative_slope,
        });
    }
    Ok(vec![layer])
}

pub(crate) fn power_from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.power_param.clone().unwrap_or_default();
    let config = PowerConfig {
        power: param.power,
        scale: param.scale,
        shift: param.shift,
    };
    Ok(single(layer, ctx, Operator::Power(config)))
}

pub(crate) fn power_to_caffe(
    node: &Node,
    config: &PowerConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::Power);
    layer.power_param = Some(PowerParameter {
        power: config.power,
        scale: config.scale,
        shift: config.shift,
    });
    Ok(vec![layer])
}

pub(crate) fn elu_from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.elu_param.clone().unwrap_or_default();
    Ok(single(layer, ctx, Operator::Elu(EluConfig { alpha: param.alpha })))
}

pub(crate) fn elu_to_caffe(
    node: &Node,
    config: &EluConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::Elu);
    layer.elu_param = Some(EluParameter {
        alpha: config.alpha,
    });
    Ok(vec![layer])
}

/// PReLU carries its slopes as blob #0.
pub(crate) fn prelu_from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.prelu_param.clone().unwrap_or_default();
    let slopes = required_tensor(layer, 0)?.flatten();

    if param.channel_shared && slopes.num_elements() != 1 {
        return Err(ConvertError::malformed(
            &layer.name,
            format!("shared PReLU holds {} slopes", slopes.num_elements()),
        ));
    }

    let config = PReluConfig {
        num_parameters: slopes.num_elements(),
        channel_shared: param.channel_shared,
    };
    log::debug!("PReLU {} config: {config:?}", layer.name);

    Ok(Extracted::single(
        Node::new(&layer.name, Operator::PRelu(config))
            .with_inputs(ctx.inputs.clone())
            .with_weight(slopes),
    ))
}

pub(crate) fn prelu_to_caffe(
    node: &Node,
    config: &PReluConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::PRelu);
    layer.blobs.push(tensor_to_blob(&required_weight(node)?.flatten()));
    layer.prelu_param = Some(PReluParameter {
        channel_shared: config.channel_shared,
    });
    Ok(vec![layer])
}

pub(crate) fn threshold_from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.threshold_param.clone().unwrap_or_default();
    let config = ThresholdConfig {
        threshold: param.threshold,
    };
    Ok(single(layer, ctx, Operator::Threshold(config)))
}

pub(crate) fn threshold_to_caffe(
    node: &Node,
    config: &ThresholdConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::Threshold);
    layer.threshold_param = Some(ThresholdParameter {
        threshold: config.threshold,
    });
    Ok(vec![layer])
}

/// Softmax and the softmax losses, which are all imported as a plain softmax.
pub(crate) fn softmax_from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.softmax_param.clone().unwrap_or_default();
    let inputs = if layer.bottom.len() > 1 {
        // The loss variants take labels as a second bottom.
        log::debug!("Softmax {} drops {} label inputs", layer.name, layer.bottom.len() - 1);
        ctx.inputs.iter().take(1).cloned().collect()
    } else {
        ctx.inputs.clone()
    };

    Ok(Extracted::single(
        Node::new(&layer.name, Operator::Softmax(SoftmaxConfig { axis: param.axis }))
            .with_inputs(inputs),
    ))
}

pub(crate) fn softmax_to_caffe(
    node: &Node,
    config: &SoftmaxConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::Softmax);
    layer.softmax_param = Some(SoftmaxParameter { axis: config.axis });
    Ok(vec![layer])
}
