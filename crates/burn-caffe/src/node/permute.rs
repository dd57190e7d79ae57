use crate::caffe::{LayerParameter, PermuteParameter};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::to_caffe::ExportContext;

/// Configuration for an axis permutation expressed as successive swaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransposeConfig {
    /// Pairs of axes swapped in order.
    pub swaps: Vec<(usize, usize)>,
}

impl TransposeConfig {
    /// Create a new TransposeConfig
    pub fn new(swaps: Vec<(usize, usize)>) -> Self {
        Self { swaps }
    }

    /// The permutation obtained by applying the swaps to the identity of `rank` axes.
    pub fn order(&self, rank: usize) -> Vec<usize> {
        let rank = self
            .swaps
            .iter()
            .map(|&(a, b)| a.max(b) + 1)
            .fold(rank, usize::max);
        let mut order: Vec<usize> = (0..rank).collect();
        for &(a, b) in &self.swaps {
            order.swap(a, b);
        }
        order
    }
}

/// The only permutation understood: swapping the two spatial axes of an NCHW map.
const SPATIAL_SWAP: (usize, usize) = (2, 3);

/// Permute layers always import as a swap of axes 2 and 3; any other declared order is lost.
pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let config = TransposeConfig::new(vec![SPATIAL_SWAP]);
    let declared: Vec<usize> = layer
        .permute_param
        .as_ref()
        .map(|param| param.order.iter().map(|&axis| axis as usize).collect())
        .unwrap_or_default();

    if !declared.is_empty() && declared != config.order(declared.len()) {
        log::warn!(
            "Permute {} declares order {declared:?}, imported as a swap of axes 2 and 3",
            layer.name
        );
    }

    Ok(Extracted::single(
        Node::new(&layer.name, Operator::Transpose(config)).with_inputs(ctx.inputs.clone()),
    ))
}

pub(crate) fn to_caffe(
    node: &Node,
    config: &TransposeConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::Permute);
    layer.permute_param = Some(PermuteParameter {
        order: config.order(4).into_iter().map(|axis| axis as u32).collect(),
    });
    Ok(vec![layer])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::test_utils::{LayerBuilder, extract_node, synthesize_one};

    fn permute_layer(order: Vec<u32>) -> LayerParameter {
        LayerBuilder::new("perm", "Permute")
            .bottom("conv")
            .with(|layer| layer.permute_param = Some(PermuteParameter { order }))
            .build()
    }

    #[test]
    fn any_order_imports_as_spatial_swap() {
        for order in [vec![0, 1, 3, 2], vec![0, 2, 3, 1], vec![]] {
            let node = extract_node(&permute_layer(order));
            assert_eq!(node.op, Operator::Transpose(TransposeConfig::new(vec![(2, 3)])));
        }
    }

    #[test]
    fn export_writes_full_order() {
        let node = extract_node(&permute_layer(vec![0, 2, 3, 1]));

        assert_eq!(
            synthesize_one(&node).permute_param.unwrap().order,
            vec![0, 1, 3, 2]
        );
    }

    #[test]
    fn order_applies_swaps_in_sequence() {
        let config = TransposeConfig::new(vec![(1, 2), (2, 3)]);

        assert_eq!(config.order(4), vec![0, 2, 3, 1]);
        assert_eq!(TransposeConfig::new(vec![(0, 5)]).order(4), vec![5, 1, 2, 3, 4, 0]);
    }
}
