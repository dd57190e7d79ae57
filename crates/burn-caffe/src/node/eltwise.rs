use crate::caffe::{EltwiseOp, EltwiseParameter, LayerParameter};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::to_caffe::ExportContext;

/// Element-wise combination of several inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EltwiseKind {
    Product,
    Sum,
    Max,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EltwiseConfig {
    pub kind: EltwiseKind,
    /// Per-input weights of a sum, empty for a plain sum.
    pub coefficients: Vec<f32>,
}

pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.eltwise_param.clone().unwrap_or_default();
    let kind = match param.operation {
        EltwiseOp::Prod => EltwiseKind::Product,
        EltwiseOp::Sum => EltwiseKind::Sum,
        EltwiseOp::Max => EltwiseKind::Max,
    };

    if !param.coeff.is_empty() {
        if kind != EltwiseKind::Sum {
            return Err(ConvertError::malformed(
                &layer.name,
                "coefficients are only allowed on a sum",
            ));
        }
        if param.coeff.len() != ctx.inputs.len() {
            return Err(ConvertError::malformed(
                &layer.name,
                format!(
                    "{} coefficients for {} inputs",
                    param.coeff.len(),
                    ctx.inputs.len()
                ),
            ));
        }
    }

    let config = EltwiseConfig {
        kind,
        coefficients: param.coeff,
    };
    Ok(Extracted::single(
        Node::new(&layer.name, Operator::Eltwise(config)).with_inputs(ctx.inputs.clone()),
    ))
}

pub(crate) fn to_caffe(
    node: &Node,
    config: &EltwiseConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::Eltwise);
    layer.eltwise_param = Some(EltwiseParameter {
        operation: match config.kind {
            EltwiseKind::Product => EltwiseOp::Prod,
            EltwiseKind::Sum => EltwiseOp::Sum,
            EltwiseKind::Max => EltwiseOp::Max,
        },
        coeff: config.coefficients.clone(),
    });
    Ok(vec![layer])
}
