//! Per-operator converters.
//!
//! Each module owns one family of operators: its graph-side configuration, the extractor
//! turning a layer into nodes (`from_caffe`) and the synthesizer turning a node back into
//! layers (`to_caffe`).

pub mod activation;
pub mod batch_norm;
pub mod bias;
pub mod concat;
pub mod conv;
pub mod detection_output;
pub mod dropout;
pub mod eltwise;
pub mod input;
pub mod linear;
pub mod lrn;
pub mod normalize;
pub mod permute;
pub mod pooling;
pub mod prior_box;
pub mod reshape;
pub mod scale;
pub mod tile;

#[cfg(test)]
pub(crate) mod test_utils;

use crate::error::ConvertError;
use crate::ir::Node;
use crate::tensor::ParamTensor;

/// A pair written the way the wire format expects it: a single shared value when both axes
/// agree, otherwise explicit `(h, w)` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PairField {
    Shared(u32),
    Split(u32, u32),
}

impl PairField {
    pub(crate) fn of(node: &str, what: &str, [h, w]: [usize; 2]) -> Self {
        if h == w {
            return PairField::Shared(h as u32);
        }
        if h == 0 || w == 0 {
            log::warn!(
                "{what} [{h}, {w}] of {node} has a zero axis and reads back as the default on both axes"
            );
        }
        PairField::Split(h as u32, w as u32)
    }
}

/// The node's weight, failing as a missing blob #0 when absent.
pub(crate) fn required_weight(node: &Node) -> Result<&ParamTensor, ConvertError> {
    node.weight
        .as_ref()
        .ok_or_else(|| ConvertError::missing_blob(&node.name, 0))
}

/// `tensor` under `shape`, failing with a shape error attributed to `name`.
pub(crate) fn reshaped(
    name: &str,
    tensor: &ParamTensor,
    shape: Vec<usize>,
) -> Result<ParamTensor, ConvertError> {
    tensor
        .reshape(shape)
        .map_err(|err| ConvertError::shape(name, err))
}
