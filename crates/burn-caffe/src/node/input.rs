use crate::caffe::{BlobShape, InputParameter, LayerParameter};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::to_caffe::ExportContext;

/// Configuration for graph input placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputConfig {
    /// Declared shape, when the model states one.
    pub shape: Option<Vec<usize>>,
}

impl InputConfig {
    /// Create a new InputConfig
    pub fn new(shape: Option<Vec<usize>>) -> Self {
        Self { shape }
    }
}

/// One placeholder per top, each named after its top.
pub(crate) fn from_caffe(
    layer: &LayerParameter,
    _ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let shapes = layer
        .input_param
        .as_ref()
        .map(|param| param.shape.as_slice())
        .unwrap_or_default();

    let mut nodes = Vec::with_capacity(layer.top.len());
    for (index, top) in layer.top.iter().enumerate() {
        // A single declared shape applies to every top.
        let declared = shapes.get(index).or(match shapes {
            [only] => Some(only),
            _ => None,
        });
        let shape = declared
            .map(|shape| {
                shape
                    .dim
                    .iter()
                    .map(|&d| usize::try_from(d))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| ConvertError::malformed(&layer.name, "negative input dimension"))
            })
            .transpose()?;

        log::debug!("Input {top} of {} with shape {shape:?}", layer.name);
        nodes.push(Node::new(top, Operator::Input(InputConfig::new(shape))));
    }

    Ok(Extracted::per_top(nodes))
}

/// An `Input` layer whose single top carries the node's name.
pub(crate) fn to_caffe(
    node: &Node,
    config: &InputConfig,
    _ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = LayerParameter::new(&node.name, LayerType::Input.as_str());
    layer.top = vec![node.name.clone()];
    if let Some(shape) = &config.shape {
        layer.input_param = Some(InputParameter {
            shape: vec![BlobShape::from_dims(shape)],
        });
    }
    Ok(vec![layer])
}
