use crate::blob::{blob_dims, blob_to_tensor, optional_tensor, required_blob, tensor_to_blob};
use crate::caffe::{LayerParameter, ScaleParameter};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::node::{required_weight, reshaped};
use crate::to_caffe::ExportContext;

/// Configuration for per-element scaling with an optional shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleConfig {
    /// Broadcast shape of the scale (and bias) tensors.
    pub shape: Vec<usize>,
    /// Whether a bias is added after scaling.
    pub bias: bool,
}

impl ScaleConfig {
    /// Create a new ScaleConfig
    pub fn new(shape: Vec<usize>, bias: bool) -> Self {
        Self { shape, bias }
    }
}

/// A 1-D size broadcast over a batch: `[1, size]` for flat layers, `[1, size, 1, 1]` otherwise.
fn broadcast_shape(size: usize, flat: bool) -> Vec<usize> {
    if flat {
        vec![1, size]
    } else {
        vec![1, size, 1, 1]
    }
}

/// Scale layers.
///
/// The scale shape is the bias blob's shape when the layer carries one. Otherwise it is the
/// slice of the weight's shape starting at `axis` and spanning `num_axes` dimensions (up to the
/// last dimension, exclusive, when `num_axes` is -1). A 1-D shape, declared or sliced, is
/// broadcast over the batch.
pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.scale_param.clone().unwrap_or_default();
    let flat = ctx.config.is_flat(&layer.name);
    let weight_blob = required_blob(layer, 0)?;

    let shape = match layer.blob(1) {
        Some(bias_blob) => {
            let dims = blob_dims(bias_blob).unwrap_or_else(|| vec![bias_blob.len()]);
            match dims.as_slice() {
                [size] => broadcast_shape(*size, flat),
                _ => dims,
            }
        }
        None => {
            let dims = blob_dims(weight_blob).unwrap_or_else(|| vec![weight_blob.len()]);
            let sliced = if dims.len() == 1 {
                dims
            } else {
                slice_dims(&layer.name, &dims, param.axis, param.num_axes)?
            };
            match sliced.as_slice() {
                [size] => broadcast_shape(*size, flat),
                _ => sliced,
            }
        }
    };

    let weight = reshaped(
        &layer.name,
        &blob_to_tensor(&layer.name, weight_blob)?,
        shape.clone(),
    )?;
    let bias = optional_tensor(layer, 1)?
        .map(|bias| reshaped(&layer.name, &bias, shape.clone()))
        .transpose()?;

    log::debug!("Scale {} with shape {shape:?}", layer.name);

    let config = ScaleConfig::new(shape, bias.is_some());
    Ok(Extracted::single(
        Node::new(&layer.name, Operator::Scale(config))
            .with_inputs(ctx.inputs.clone())
            .with_weight(weight)
            .with_bias(bias),
    ))
}

fn slice_dims(
    layer: &str,
    dims: &[usize],
    axis: i32,
    num_axes: i32,
) -> Result<Vec<usize>, ConvertError> {
    let rank = dims.len() as i32;
    let start = if axis < 0 { axis + rank } else { axis };
    let end = if num_axes == -1 {
        rank - 1
    } else {
        start + num_axes
    };

    if start < 0 || end > rank || start >= end {
        return Err(ConvertError::malformed(
            layer,
            format!("axis {axis} with {num_axes} axes does not fit a rank {rank} weight"),
        ));
    }
    Ok(dims[start as usize..end as usize].to_vec())
}

/// The shape is written on the blobs and spanned in full, so it reads back unchanged.
pub(crate) fn to_caffe(
    node: &Node,
    config: &ScaleConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::Scale);

    let weight = reshaped(&node.name, required_weight(node)?, config.shape.clone())?;
    layer.blobs.push(tensor_to_blob(&weight));
    if let Some(bias) = &node.bias {
        layer
            .blobs
            .push(tensor_to_blob(&reshaped(&node.name, bias, config.shape.clone())?));
    }

    layer.scale_param = Some(ScaleParameter {
        axis: 0,
        num_axes: config.shape.len() as i32,
        bias_term: node.bias.is_some(),
    });

    Ok(vec![layer])
}
