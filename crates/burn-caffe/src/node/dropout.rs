use crate::caffe::{DropoutParameter, LayerParameter};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::to_caffe::ExportContext;

/// Configuration for Dropout operations
#[derive(Debug, Clone, PartialEq)]
pub struct DropoutConfig {
    /// Probability of dropping out a unit
    pub prob: f32,
}

impl DropoutConfig {
    /// Create a new DropoutConfig
    pub fn new(prob: f32) -> Self {
        Self { prob }
    }
}

pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.dropout_param.clone().unwrap_or_default();
    if !(0.0..=1.0).contains(&param.dropout_ratio) {
        return Err(ConvertError::malformed(
            &layer.name,
            format!("dropout ratio {} is not a probability", param.dropout_ratio),
        ));
    }

    Ok(Extracted::single(
        Node::new(&layer.name, Operator::Dropout(DropoutConfig::new(param.dropout_ratio)))
            .with_inputs(ctx.inputs.clone()),
    ))
}

pub(crate) fn to_caffe(
    node: &Node,
    config: &DropoutConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::Dropout);
    layer.dropout_param = Some(DropoutParameter {
        dropout_ratio: config.prob,
    });
    Ok(vec![layer])
}
