use burn_tensor::DType;

use crate::blob::{blob_dims, blob_to_tensor, optional_tensor, required_blob, tensor_to_blob};
use crate::caffe::{InnerProductParameter, LayerParameter};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::node::reshape::ReshapeConfig;
use crate::node::{required_weight, reshaped};
use crate::tensor::ParamTensor;
use crate::to_caffe::ExportContext;

/// Configuration for fully connected layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConfig {
    /// Input dimension (features)
    pub d_input: usize,
    /// Output dimension (features)
    pub d_output: usize,
    /// Whether bias is used
    pub bias: bool,
}

impl LinearConfig {
    /// Create a new LinearConfig
    pub fn new(d_input: usize, d_output: usize) -> Self {
        Self {
            d_input,
            d_output,
            bias: true,
        }
    }

    /// Set whether bias is used
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }
}

/// Inner product layers.
///
/// The node's weight is always `[d_output, d_input]`. When the two sizes differ, the layer is
/// preceded by a reshape flattening every non-batch dimension, named `<layer>_reshape`, unless
/// its input already comes from that very reshape.
pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.inner_product_param.clone().unwrap_or_default();
    let weight_blob = required_blob(layer, 0)?;

    // Legacy inner-product weights are (1, 1, out, in).
    let (rows, cols) = match (&weight_blob.shape, blob_dims(weight_blob)) {
        (Some(_), Some(dims)) if dims.len() >= 2 => (dims[0], dims[1..].iter().product()),
        (None, Some(_)) => (weight_blob.height as usize, weight_blob.width as usize),
        _ => {
            return Err(ConvertError::malformed(
                &layer.name,
                "inner product weight needs at least two dimensions",
            ));
        }
    };

    // A transposed weight is stored [in, out].
    let (d_input, stored_output) = if param.transpose {
        (rows, cols)
    } else {
        (cols, rows)
    };
    let d_output = match param.num_output {
        0 => stored_output,
        n => n as usize,
    };
    if d_output != stored_output {
        return Err(ConvertError::malformed(
            &layer.name,
            format!("num_output is {d_output} but the weight holds {stored_output} outputs"),
        ));
    }

    let mut weight = blob_to_tensor(&layer.name, weight_blob)?;
    weight = if param.transpose {
        transpose(&layer.name, &weight, rows, cols)?
    } else {
        reshaped(&layer.name, &weight, vec![d_output, d_input])?
    };
    let bias = optional_tensor(layer, 1)?.map(|bias| bias.flatten());

    let config = LinearConfig::new(d_input, d_output).with_bias(bias.is_some());
    log::debug!("Linear {} config: {config:?}", layer.name);

    let linear = Node::new(&layer.name, Operator::Linear(config))
        .with_weight(weight)
        .with_bias(bias);

    let flatten = Operator::Reshape(ReshapeConfig::new(vec![d_input as i64]).with_batch_mode(true));
    if d_input == d_output || ctx.input_op(0) == Some(&flatten) {
        return Ok(Extracted::single(linear.with_inputs(ctx.inputs.clone())));
    }

    let reshape =
        Node::new(format!("{}_reshape", layer.name), flatten).with_inputs(ctx.inputs.clone());
    log::debug!("Inserting {} before {}", reshape.name, layer.name);

    Ok(Extracted::chain(reshape, [linear]))
}

/// `[rows, cols]` to `[cols, rows]`, keeping the element type.
fn transpose(
    name: &str,
    tensor: &ParamTensor,
    rows: usize,
    cols: usize,
) -> Result<ParamTensor, ConvertError> {
    if tensor.num_elements() != rows * cols {
        return Err(ConvertError::malformed(
            name,
            format!("weight holds {} values, expected {}", tensor.num_elements(), rows * cols),
        ));
    }

    let transposed = match tensor.dtype() {
        DType::F64 => ParamTensor::new(swap_axes(&tensor.to_f64_vec(), rows, cols), vec![cols, rows]),
        _ => ParamTensor::from_f32(swap_axes(&tensor.to_f32_vec(), rows, cols), vec![cols, rows]),
    };
    transposed.map_err(|err| ConvertError::shape(name, err))
}

fn swap_axes<T: Copy>(values: &[T], rows: usize, cols: usize) -> Vec<T> {
    (0..cols)
        .flat_map(|col| (0..rows).map(move |row| values[row * cols + col]))
        .collect()
}

pub(crate) fn to_caffe(
    node: &Node,
    config: &LinearConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::InnerProduct);

    let weight = reshaped(
        &node.name,
        required_weight(node)?,
        vec![config.d_output, config.d_input],
    )?;
    layer.blobs.push(tensor_to_blob(&weight));
    if let Some(bias) = &node.bias {
        layer.blobs.push(tensor_to_blob(&bias.flatten()));
    }

    layer.inner_product_param = Some(InnerProductParameter {
        num_output: config.d_output as u32,
        bias_term: node.bias.is_some(),
        ..Default::default()
    });

    Ok(vec![layer])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caffe::BlobProto;
    use crate::config::ConverterConfig;
    use crate::ir::OperatorKind;
    use crate::node::test_utils::{LayerBuilder, extract, extract_node, synthesize_one};
    use pretty_assertions::assert_eq;

    fn ip_layer(weight: &[usize], num_output: u32, bias: bool) -> LayerParameter {
        let mut builder = LayerBuilder::new("ip1", "InnerProduct")
            .bottom("pool2")
            .top("ip1")
            .blob(weight);
        if bias {
            builder = builder.blob(&[weight[0]]);
        }
        builder
            .with(|layer| {
                layer.inner_product_param = Some(InnerProductParameter {
                    num_output,
                    bias_term: bias,
                    ..Default::default()
                })
            })
            .build()
    }

    #[test]
    fn square_layer_is_a_single_node() {
        let extracted = extract(&ip_layer(&[10, 10], 10, true)).unwrap();
        let nodes = extracted.nodes();

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].op, Operator::Linear(LinearConfig::new(10, 10)));
        assert_eq!(nodes[0].inputs, vec!["pool2".to_string()]);
    }

    #[test]
    fn differing_sizes_insert_a_reshape() {
        let extracted = extract(&ip_layer(&[500, 800], 500, true)).unwrap();
        let nodes = extracted.nodes();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name, "ip1_reshape");
        assert_eq!(
            nodes[0].op,
            Operator::Reshape(ReshapeConfig::new(vec![800]).with_batch_mode(true))
        );
        assert_eq!(nodes[0].inputs, vec!["pool2".to_string()]);

        let linear = extracted.primary().unwrap();
        assert_eq!(linear.name, "ip1");
        assert_eq!(linear.kind(), OperatorKind::Linear);
        assert_eq!(linear.inputs, vec!["ip1_reshape".to_string()]);
        assert_eq!(linear.weight.as_ref().unwrap().shape(), &[500, 800]);
        assert_eq!(linear.bias.as_ref().unwrap().shape(), &[500]);
    }

    #[test]
    fn upstream_flatten_is_reused() {
        let upstream = Operator::Reshape(ReshapeConfig::new(vec![800]).with_batch_mode(true));
        let config = ConverterConfig::default();
        let ctx = ImportContext {
            inputs: vec!["ip1_reshape".to_string()],
            input_ops: vec![&upstream],
            config: &config,
        };
        let extracted = from_caffe(&ip_layer(&[500, 800], 500, false), &ctx).unwrap();

        assert_eq!(extracted.nodes().len(), 1);
        assert_eq!(
            extracted.primary().unwrap().inputs,
            vec!["ip1_reshape".to_string()]
        );
    }

    #[test]
    fn legacy_weight_uses_height_and_width() {
        let layer = LayerBuilder::new("ip", "InnerProduct")
            .bottom("x")
            .raw_blob(BlobProto::legacy(1, 1, 4, 6, vec![0.0; 24]))
            .build();
        let node = extract_node(&layer);

        assert_eq!(node.op, Operator::Linear(LinearConfig::new(6, 4).with_bias(false)));
        assert_eq!(node.weight.as_ref().unwrap().shape(), &[4, 6]);
    }

    #[test]
    fn transposed_weight_is_rearranged() {
        let layer = LayerBuilder::new("ip", "InnerProduct")
            .bottom("x")
            .blob_data(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .with(|layer| {
                layer.inner_product_param = Some(InnerProductParameter {
                    transpose: true,
                    ..Default::default()
                })
            })
            .build();
        let node = extract_node(&layer);

        assert_eq!(node.op, Operator::Linear(LinearConfig::new(2, 3).with_bias(false)));
        let weight = node.weight.unwrap();
        assert_eq!(weight.shape(), &[3, 2]);
        assert_eq!(weight.to_f32_vec(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn num_output_must_match_weight() {
        assert!(matches!(
            extract(&ip_layer(&[10, 4], 12, false)).unwrap_err(),
            ConvertError::MalformedShape { .. }
        ));
    }

    #[test]
    fn export_and_reimport() {
        let original = extract_node(&ip_layer(&[7, 7], 7, false));
        let exported = synthesize_one(&original);

        assert_eq!(exported.layer_type, "InnerProduct");
        assert_eq!(exported.inner_product_param.as_ref().unwrap().num_output, 7);
        assert_eq!(exported.blobs.len(), 1);

        let mut reimported = extract_node(&exported);
        reimported.inputs = original.inputs.clone();
        assert_eq!(reimported, original);
    }
}
