use crate::caffe::{BlobShape, FlattenParameter, LayerParameter, ReshapeParameter};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::to_caffe::ExportContext;

/// Configuration for reshaping to a fixed shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReshapeConfig {
    /// Target shape; `-1` infers one dimension, `0` copies the input dimension.
    pub shape: Vec<i64>,
    /// Keep the batch dimension and apply `shape` to each sample.
    pub batch_mode: bool,
}

impl ReshapeConfig {
    /// Create a new ReshapeConfig
    pub fn new(shape: Vec<i64>) -> Self {
        Self {
            shape,
            batch_mode: false,
        }
    }

    /// Set whether the batch dimension is kept
    pub fn with_batch_mode(mut self, batch_mode: bool) -> Self {
        self.batch_mode = batch_mode;
        self
    }
}

/// Configuration for collapsing a range of axes into one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenConfig {
    /// First axis collapsed.
    pub start_dim: i32,
    /// Last axis collapsed, inclusive; negative values count from the end.
    pub end_dim: i32,
}

/// A leading 0 in the declared shape keeps the batch dimension.
pub(crate) fn reshape_from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.reshape_param.clone().unwrap_or_default();
    let dims = param
        .shape
        .map(|shape| shape.dim)
        .ok_or_else(|| ConvertError::malformed(&layer.name, "reshape declares no shape"))?;

    if param.axis != 0 || param.num_axes != -1 {
        log::warn!(
            "Reshape {} restricted to axis {} with {} axes is imported as a full reshape",
            layer.name,
            param.axis,
            param.num_axes
        );
    }

    let config = match dims.split_first() {
        Some((0, rest)) => ReshapeConfig::new(rest.to_vec()).with_batch_mode(true),
        _ => ReshapeConfig::new(dims),
    };
    log::debug!("Reshape {} config: {config:?}", layer.name);

    Ok(Extracted::single(
        Node::new(&layer.name, Operator::Reshape(config)).with_inputs(ctx.inputs.clone()),
    ))
}

pub(crate) fn reshape_to_caffe(
    node: &Node,
    config: &ReshapeConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut dim = Vec::with_capacity(config.shape.len() + 1);
    if config.batch_mode {
        dim.push(0);
    }
    dim.extend_from_slice(&config.shape);

    let mut layer = ctx.layer(&node.name, LayerType::Reshape);
    layer.reshape_param = Some(ReshapeParameter {
        shape: Some(BlobShape { dim }),
        ..Default::default()
    });
    Ok(vec![layer])
}

pub(crate) fn flatten_from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.flatten_param.clone().unwrap_or_default();
    let config = FlattenConfig {
        start_dim: param.axis,
        end_dim: param.end_axis,
    };
    Ok(Extracted::single(
        Node::new(&layer.name, Operator::Flatten(config)).with_inputs(ctx.inputs.clone()),
    ))
}

pub(crate) fn flatten_to_caffe(
    node: &Node,
    config: &FlattenConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::Flatten);
    layer.flatten_param = Some(FlattenParameter {
        axis: config.start_dim,
        end_axis: config.end_dim,
    });
    Ok(vec![layer])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::test_utils::{LayerBuilder, extract, extract_node, synthesize_one};
    use pretty_assertions::assert_eq;

    fn reshape_layer(dim: Vec<i64>) -> LayerParameter {
        LayerBuilder::new("reshape", "Reshape")
            .bottom("conv")
            .with(|layer| {
                layer.reshape_param = Some(ReshapeParameter {
                    shape: Some(BlobShape { dim }),
                    ..Default::default()
                })
            })
            .build()
    }

    #[test]
    fn leading_zero_is_batch_mode() {
        let node = extract_node(&reshape_layer(vec![0, -1, 21]));
        assert_eq!(
            node.op,
            Operator::Reshape(ReshapeConfig::new(vec![-1, 21]).with_batch_mode(true))
        );

        let exported = synthesize_one(&node);
        assert_eq!(
            exported.reshape_param.unwrap().shape.unwrap().dim,
            vec![0, -1, 21]
        );
    }

    #[test]
    fn plain_shape() {
        let node = extract_node(&reshape_layer(vec![1, 3, 16, 16]));

        assert_eq!(node.op, Operator::Reshape(ReshapeConfig::new(vec![1, 3, 16, 16])));
    }

    #[test]
    fn missing_shape_is_malformed() {
        let layer = LayerBuilder::new("reshape", "Reshape").build();

        assert!(matches!(
            extract(&layer).unwrap_err(),
            ConvertError::MalformedShape { .. }
        ));
    }

    #[test]
    fn flatten_axes_round_trip() {
        let layer = LayerBuilder::new("flat", "Flatten")
            .bottom("conv")
            .with(|layer| {
                layer.flatten_param = Some(FlattenParameter {
                    axis: 1,
                    end_axis: -1,
                })
            })
            .build();
        let node = extract_node(&layer);

        assert_eq!(
            node.op,
            Operator::Flatten(FlattenConfig {
                start_dim: 1,
                end_dim: -1
            })
        );
        assert_eq!(synthesize_one(&node).flatten_param, layer.flatten_param);
    }
}
