use crate::caffe::{LayerParameter, TileParameter};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::to_caffe::ExportContext;

/// Configuration for repeating a tensor along one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileConfig {
    /// Axis to repeat along; negative values count from the end.
    pub axis: i32,
    /// Number of copies.
    pub copies: usize,
}

pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.tile_param.clone().unwrap_or_default();
    let copies = usize::try_from(param.tiles)
        .ok()
        .filter(|&copies| copies > 0)
        .ok_or_else(|| {
            ConvertError::malformed(&layer.name, format!("tile count {} is not positive", param.tiles))
        })?;

    let config = TileConfig {
        axis: param.axis,
        copies,
    };
    Ok(Extracted::single(
        Node::new(&layer.name, Operator::Tile(config)).with_inputs(ctx.inputs.clone()),
    ))
}

pub(crate) fn to_caffe(
    node: &Node,
    config: &TileConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::Tile);
    layer.tile_param = Some(TileParameter {
        axis: config.axis,
        tiles: config.copies as i32,
    });
    Ok(vec![layer])
}
