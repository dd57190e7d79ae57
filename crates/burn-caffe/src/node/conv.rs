use crate::blob::{blob_to_tensor, optional_tensor, required_blob, tensor_to_blob};
use crate::caffe::{ConvolutionParameter, LayerParameter};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::node::{PairField, required_weight, reshaped};
use crate::resolve::resolve_conv;
use crate::to_caffe::ExportContext;

/// Configuration for 2D convolutions, plain, transposed or dilated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvolutionConfig {
    /// Input channels.
    pub in_channels: usize,
    /// Output channels.
    pub out_channels: usize,
    /// Kernel size `[h, w]`.
    pub kernel_size: [usize; 2],
    /// Stride `[h, w]`.
    pub stride: [usize; 2],
    /// Zero padding `[h, w]`.
    pub padding: [usize; 2],
    /// Dilation `[h, w]`, `[1, 1]` when not dilated.
    pub dilation: [usize; 2],
    /// Number of channel groups.
    pub groups: usize,
    /// Whether a bias is added.
    pub bias: bool,
}

impl ConvolutionConfig {
    /// Create a new ConvolutionConfig with unit stride, no padding and a single group.
    pub fn new(in_channels: usize, out_channels: usize, kernel_size: [usize; 2]) -> Self {
        Self {
            in_channels,
            out_channels,
            kernel_size,
            stride: [1, 1],
            padding: [0, 0],
            dilation: [1, 1],
            groups: 1,
            bias: true,
        }
    }

    /// Set the stride
    pub fn with_stride(mut self, stride: [usize; 2]) -> Self {
        self.stride = stride;
        self
    }

    /// Set the padding
    pub fn with_padding(mut self, padding: [usize; 2]) -> Self {
        self.padding = padding;
        self
    }

    /// Set the dilation
    pub fn with_dilation(mut self, dilation: [usize; 2]) -> Self {
        self.dilation = dilation;
        self
    }

    /// Set the group count
    pub fn with_groups(mut self, groups: usize) -> Self {
        self.groups = groups;
        self
    }

    /// Set whether bias is used
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    fn is_dilated(&self) -> bool {
        self.dilation != [1, 1]
    }
}

/// Convolution and deconvolution layers.
///
/// The operator kind is picked from the geometry: any dilation selects a dilated convolution,
/// otherwise `transposed` selects between a full (transposed) and a plain convolution.
pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
    transposed: bool,
) -> Result<Extracted, ConvertError> {
    let param = layer.convolution_param.clone().unwrap_or_default();
    let weight_blob = required_blob(layer, 0)?;
    let (geometry, channels) = resolve_conv(&layer.name, &param, weight_blob)?;

    if transposed && geometry.dilation.is_some() {
        log::warn!(
            "Dilated deconvolution {} is imported as a dilated convolution",
            layer.name
        );
    }
    let transposed = transposed && geometry.dilation.is_none();

    // A deconvolution weight is laid out as [in, out / group, kh, kw].
    let (in_channels, out_channels) = if transposed {
        (channels.leading, channels.trailing)
    } else {
        (channels.trailing, channels.leading)
    };

    if in_channels % geometry.group != 0 || out_channels % geometry.group != 0 {
        return Err(ConvertError::malformed(
            &layer.name,
            format!(
                "group {} does not divide {in_channels} input and {out_channels} output channels",
                geometry.group
            ),
        ));
    }

    let weight = blob_to_tensor(&layer.name, weight_blob)?;
    let bias = optional_tensor(layer, 1)?.map(|bias| bias.flatten());

    let config = ConvolutionConfig::new(in_channels, out_channels, geometry.kernel)
        .with_stride(geometry.stride)
        .with_padding(geometry.pad)
        .with_dilation(geometry.dilation.unwrap_or([1, 1]))
        .with_groups(geometry.group)
        .with_bias(bias.is_some());

    log::debug!("Convolution {} config: {config:?}", layer.name);

    let op = match (geometry.dilation, transposed) {
        (Some(_), _) => Operator::DilatedConvolution(config),
        (None, true) => Operator::FullConvolution(config),
        (None, false) => Operator::Convolution(config),
    };

    Ok(Extracted::single(
        Node::new(&layer.name, op)
            .with_inputs(ctx.inputs.clone())
            .with_weight(weight)
            .with_bias(bias),
    ))
}

pub(crate) fn to_caffe(
    node: &Node,
    config: &ConvolutionConfig,
    ctx: &ExportContext,
    transposed: bool,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let layer_type = if transposed {
        LayerType::Deconvolution
    } else {
        LayerType::Convolution
    };
    let mut layer = ctx.layer(&node.name, layer_type);

    let group = config.groups.max(1);
    let [kh, kw] = config.kernel_size;
    let dims = if transposed {
        vec![config.in_channels, config.out_channels / group, kh, kw]
    } else {
        vec![config.out_channels, config.in_channels / group, kh, kw]
    };
    let weight = reshaped(&node.name, required_weight(node)?, dims)?;

    layer.blobs.push(tensor_to_blob(&weight));
    if let Some(bias) = &node.bias {
        layer.blobs.push(tensor_to_blob(&bias.flatten()));
    }

    let mut param = ConvolutionParameter {
        num_output: config.out_channels as u32,
        bias_term: node.bias.is_some(),
        group: group as u32,
        ..Default::default()
    };
    match PairField::of(&node.name, "kernel", config.kernel_size) {
        PairField::Shared(k) => param.kernel_size = vec![k],
        PairField::Split(h, w) => (param.kernel_h, param.kernel_w) = (h, w),
    }
    match PairField::of(&node.name, "stride", config.stride) {
        PairField::Shared(s) => param.stride = vec![s],
        PairField::Split(h, w) => (param.stride_h, param.stride_w) = (h, w),
    }
    match PairField::of(&node.name, "padding", config.padding) {
        PairField::Shared(p) => param.pad = vec![p],
        PairField::Split(h, w) => (param.pad_h, param.pad_w) = (h, w),
    }
    if config.is_dilated() {
        param.dilation = config.dilation.iter().map(|&d| d as u32).collect();
    }
    layer.convolution_param = Some(param);

    Ok(vec![layer])
}
