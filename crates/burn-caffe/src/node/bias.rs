use crate::blob::{required_tensor, tensor_to_blob};
use crate::caffe::{BiasParameter, LayerParameter};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::to_caffe::ExportContext;

/// Configuration for a learned additive bias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiasConfig {
    /// Number of bias values.
    pub size: usize,
}

/// Bias layers: the single blob, flattened, becomes the node's bias.
pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let bias = required_tensor(layer, 0)?.flatten();
    let config = BiasConfig {
        size: bias.num_elements(),
    };
    log::debug!("Bias {} with {} values", layer.name, config.size);

    Ok(Extracted::single(
        Node::new(&layer.name, Operator::Bias(config))
            .with_inputs(ctx.inputs.clone())
            .with_bias(Some(bias)),
    ))
}

pub(crate) fn to_caffe(
    node: &Node,
    config: &BiasConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let bias = node
        .bias
        .as_ref()
        .ok_or_else(|| ConvertError::missing_blob(&node.name, 0))?;
    if bias.num_elements() != config.size {
        return Err(ConvertError::malformed(
            &node.name,
            format!("bias holds {} values, expected {}", bias.num_elements(), config.size),
        ));
    }

    let mut layer = ctx.layer(&node.name, LayerType::Bias);
    layer.blobs.push(tensor_to_blob(&bias.flatten()));
    layer.bias_param = Some(BiasParameter::default());
    Ok(vec![layer])
}
