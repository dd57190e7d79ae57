use crate::blob::{required_blob, required_tensor, tensor_to_blob};
use crate::caffe::{BatchNormParameter, LayerParameter, ScaleParameter};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::tensor::ParamTensor;
use crate::to_caffe::{ExportContext, top_names};

/// Configuration for batch normalization with frozen running statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchNormConfig {
    /// Number of normalized features (channels).
    pub num_features: usize,
    /// Value added to the variance for numerical stability.
    pub epsilon: f32,
    /// Momentum of the running statistics.
    pub moving_average_fraction: f32,
    /// Whether inputs are `[N, C, H, W]` maps rather than `[N, C]` vectors.
    pub spatial: bool,
    /// Whether a learned scale and shift follow the normalization.
    pub affine: bool,
    /// Running mean, already corrected by the stored scale factor.
    pub running_mean: ParamTensor,
    /// Running variance, already corrected by the stored scale factor.
    pub running_var: ParamTensor,
}

/// Batch-norm layers: blobs are `[mean, variance, scale_factor]`.
///
/// The running statistics are stored multiplied by a scale factor; they are divided by it here,
/// and a factor of exactly zero zeroes them.
pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.batch_norm_param.clone().unwrap_or_default();

    let mean = required_tensor(layer, 0)?.flatten();
    let var = required_tensor(layer, 1)?.flatten();
    let factor_blob = required_blob(layer, 2)?;

    if mean.num_elements() != var.num_elements() {
        return Err(ConvertError::malformed(
            &layer.name,
            format!(
                "mean holds {} values but variance holds {}",
                mean.num_elements(),
                var.num_elements()
            ),
        ));
    }

    let factor = factor_blob
        .data
        .first()
        .map(|&v| v as f64)
        .or_else(|| factor_blob.double_data.first().copied())
        .ok_or_else(|| ConvertError::malformed(&layer.name, "scale factor blob is empty"))?;
    let correction = if factor == 0.0 { 0.0 } else { 1.0 / factor };

    let config = BatchNormConfig {
        num_features: mean.num_elements(),
        epsilon: param.eps,
        moving_average_fraction: param.moving_average_fraction,
        spatial: !ctx.config.is_flat(&layer.name),
        affine: false,
        running_mean: mean.scaled(correction),
        running_var: var.scaled(correction),
    };

    log::debug!(
        "BatchNorm {} with {} features, spatial: {}, correction: {correction}",
        layer.name,
        config.num_features,
        config.spatial
    );

    Ok(Extracted::single(
        Node::new(&layer.name, Operator::BatchNorm(config)).with_inputs(ctx.inputs.clone()),
    ))
}

/// A `BatchNorm` layer with a unit scale factor, followed by a `Scale` layer named
/// `<node>_scale` when the node is affine.
pub(crate) fn to_caffe(
    node: &Node,
    config: &BatchNormConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let affine = config.affine && node.weight.is_some();
    if config.affine && !affine {
        log::warn!("Affine batch norm {} has no weight, exporting without scale", node.name);
    }

    let mut bn = if affine {
        ctx.chained(ctx.bottoms, 1).layer(&node.name, LayerType::BatchNorm)
    } else {
        ctx.layer(&node.name, LayerType::BatchNorm)
    };
    bn.blobs = vec![
        tensor_to_blob(&config.running_mean),
        tensor_to_blob(&config.running_var),
        tensor_to_blob(&ParamTensor::vector(vec![1.0])),
    ];
    bn.batch_norm_param = Some(BatchNormParameter {
        eps: config.epsilon,
        moving_average_fraction: config.moving_average_fraction,
        use_global_stats: None,
    });

    let Some(weight) = node.weight.as_ref().filter(|_| affine) else {
        return Ok(vec![bn]);
    };

    let scale_name = format!("{}_scale", node.name);
    let bn_tops = top_names(&node.name, 1);
    let mut scale = ctx
        .chained(&bn_tops, ctx.fan_out)
        .layer(&scale_name, LayerType::Scale);
    scale.blobs.push(tensor_to_blob(&weight.flatten()));
    if let Some(bias) = &node.bias {
        scale.blobs.push(tensor_to_blob(&bias.flatten()));
    }
    scale.scale_param = Some(ScaleParameter {
        bias_term: node.bias.is_some(),
        ..Default::default()
    });

    Ok(vec![bn, scale])
}
