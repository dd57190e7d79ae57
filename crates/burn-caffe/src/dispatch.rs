//! Routing between declared layer types, extractors and synthesizers.

use strum::{Display, EnumString, IntoStaticStr};

use crate::caffe::LayerParameter;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::node::{
    activation, batch_norm, bias, concat, conv, detection_output, dropout, eltwise, input, linear,
    lrn, normalize, permute, pooling, prior_box, reshape, scale, tile,
};
use crate::to_caffe::{ExportContext, export_sequential};

/// Layer types understood on import.
///
/// Parsing is done on the upper-cased declared type, so `ReLU`, `RELU` and `relu` all match.
/// The `Display` form is the spelling written on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum LayerType {
    #[strum(
        to_string = "Input",
        serialize = "INPUT",
        serialize = "DATA",
        serialize = "DUMMYDATA",
        serialize = "MEMORYDATA",
        serialize = "ANNOTATEDDATA"
    )]
    Input,
    #[strum(to_string = "Convolution", serialize = "CONVOLUTION")]
    Convolution,
    #[strum(to_string = "Deconvolution", serialize = "DECONVOLUTION")]
    Deconvolution,
    #[strum(to_string = "InnerProduct", serialize = "INNERPRODUCT", serialize = "INNER_PRODUCT")]
    InnerProduct,
    #[strum(to_string = "BatchNorm", serialize = "BATCHNORM")]
    BatchNorm,
    #[strum(to_string = "Scale", serialize = "SCALE")]
    Scale,
    #[strum(to_string = "Bias", serialize = "BIAS")]
    Bias,
    #[strum(to_string = "Tile", serialize = "TILE")]
    Tile,
    #[strum(to_string = "Normalize", serialize = "NORMALIZE")]
    Normalize,
    #[strum(to_string = "Permute", serialize = "PERMUTE")]
    Permute,
    #[strum(to_string = "PriorBox", serialize = "PRIORBOX")]
    PriorBox,
    #[strum(to_string = "DetectionOutput", serialize = "DETECTIONOUTPUT")]
    DetectionOutput,
    #[strum(to_string = "ReLU", serialize = "RELU")]
    Relu,
    #[strum(to_string = "TanH", serialize = "TANH")]
    Tanh,
    #[strum(to_string = "Sigmoid", serialize = "SIGMOID")]
    Sigmoid,
    #[strum(to_string = "AbsVal", serialize = "ABSVAL")]
    AbsVal,
    #[strum(to_string = "Exp", serialize = "EXP")]
    Exp,
    #[strum(to_string = "Log", serialize = "LOG")]
    Log,
    #[strum(to_string = "Power", serialize = "POWER")]
    Power,
    #[strum(to_string = "ELU")]
    Elu,
    #[strum(to_string = "PReLU", serialize = "PRELU")]
    PRelu,
    #[strum(to_string = "Threshold", serialize = "THRESHOLD")]
    Threshold,
    #[strum(
        to_string = "Softmax",
        serialize = "SOFTMAX",
        serialize = "SOFTMAX_LOSS",
        serialize = "SOFTMAXWITHLOSS"
    )]
    Softmax,
    #[strum(to_string = "Dropout", serialize = "DROPOUT")]
    Dropout,
    #[strum(to_string = "LRN")]
    Lrn,
    #[strum(to_string = "Pooling", serialize = "POOLING")]
    Pooling,
    #[strum(to_string = "Eltwise", serialize = "ELTWISE")]
    Eltwise,
    #[strum(to_string = "Concat", serialize = "CONCAT")]
    Concat,
    #[strum(to_string = "Flatten", serialize = "FLATTEN")]
    Flatten,
    #[strum(to_string = "Reshape", serialize = "RESHAPE")]
    Reshape,
}

impl LayerType {
    /// Parse a declared type string, case-insensitively.
    pub fn parse(declared: &str) -> Result<Self, ConvertError> {
        declared
            .to_uppercase()
            .parse()
            .map_err(|_| ConvertError::unsupported(declared))
    }

    /// The canonical spelling written on export.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Run the extractor registered for `layer_type`.
pub(crate) fn extract(
    layer_type: LayerType,
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    match layer_type {
        LayerType::Input => input::from_caffe(layer, ctx),
        LayerType::Convolution => conv::from_caffe(layer, ctx, false),
        LayerType::Deconvolution => conv::from_caffe(layer, ctx, true),
        LayerType::InnerProduct => linear::from_caffe(layer, ctx),
        LayerType::BatchNorm => batch_norm::from_caffe(layer, ctx),
        LayerType::Scale => scale::from_caffe(layer, ctx),
        LayerType::Bias => bias::from_caffe(layer, ctx),
        LayerType::Tile => tile::from_caffe(layer, ctx),
        LayerType::Normalize => normalize::from_caffe(layer, ctx),
        LayerType::Permute => permute::from_caffe(layer, ctx),
        LayerType::PriorBox => prior_box::from_caffe(layer, ctx),
        LayerType::DetectionOutput => detection_output::from_caffe(layer, ctx),
        LayerType::Relu => activation::relu_from_caffe(layer, ctx),
        LayerType::Tanh => activation::plain_from_caffe(layer, ctx, Operator::Tanh),
        LayerType::Sigmoid => activation::plain_from_caffe(layer, ctx, Operator::Sigmoid),
        LayerType::AbsVal => activation::plain_from_caffe(layer, ctx, Operator::Abs),
        LayerType::Exp => activation::plain_from_caffe(layer, ctx, Operator::Exp),
        LayerType::Log => activation::plain_from_caffe(layer, ctx, Operator::Log),
        LayerType::Power => activation::power_from_caffe(layer, ctx),
        LayerType::Elu => activation::elu_from_caffe(layer, ctx),
        LayerType::PRelu => activation::prelu_from_caffe(layer, ctx),
        LayerType::Threshold => activation::threshold_from_caffe(layer, ctx),
        LayerType::Softmax => activation::softmax_from_caffe(layer, ctx),
        LayerType::Dropout => dropout::from_caffe(layer, ctx),
        LayerType::Lrn => lrn::from_caffe(layer, ctx),
        LayerType::Pooling => pooling::from_caffe(layer, ctx),
        LayerType::Eltwise => eltwise::from_caffe(layer, ctx),
        LayerType::Concat => concat::from_caffe(layer, ctx),
        LayerType::Flatten => reshape::flatten_from_caffe(layer, ctx),
        LayerType::Reshape => reshape::reshape_from_caffe(layer, ctx),
    }
}

/// Run the synthesizer registered for the node's operator.
pub(crate) fn synthesize(
    node: &Node,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    match &node.op {
        Operator::Input(config) => input::to_caffe(node, config, ctx),
        Operator::Convolution(config) | Operator::DilatedConvolution(config) => {
            conv::to_caffe(node, config, ctx, false)
        }
        Operator::FullConvolution(config) => conv::to_caffe(node, config, ctx, true),
        Operator::Linear(config) => linear::to_caffe(node, config, ctx),
        Operator::BatchNorm(config) => batch_norm::to_caffe(node, config, ctx),
        Operator::Relu(config) => activation::relu_to_caffe(node, config, ctx),
        Operator::Tanh => activation::plain_to_caffe(node, ctx, LayerType::Tanh),
        Operator::Sigmoid => activation::plain_to_caffe(node, ctx, LayerType::Sigmoid),
        Operator::Abs => activation::plain_to_caffe(node, ctx, LayerType::AbsVal),
        Operator::Exp => activation::plain_to_caffe(node, ctx, LayerType::Exp),
        Operator::Log => activation::plain_to_caffe(node, ctx, LayerType::Log),
        Operator::Power(config) => activation::power_to_caffe(node, config, ctx),
        Operator::Elu(config) => activation::elu_to_caffe(node, config, ctx),
        Operator::PRelu(config) => activation::prelu_to_caffe(node, config, ctx),
        Operator::Threshold(config) => activation::threshold_to_caffe(node, config, ctx),
        Operator::Softmax(config) => activation::softmax_to_caffe(node, config, ctx),
        Operator::Dropout(config) => dropout::to_caffe(node, config, ctx),
        Operator::Lrn(config) => lrn::to_caffe(node, config, ctx),
        Operator::Pooling(config) => pooling::to_caffe(node, config, ctx),
        Operator::Reshape(config) => reshape::reshape_to_caffe(node, config, ctx),
        Operator::Flatten(config) => reshape::flatten_to_caffe(node, config, ctx),
        Operator::Scale(config) => scale::to_caffe(node, config, ctx),
        Operator::Bias(config) => bias::to_caffe(node, config, ctx),
        Operator::Tile(config) => tile::to_caffe(node, config, ctx),
        Operator::Normalize(config) => normalize::to_caffe(node, config, ctx),
        Operator::Transpose(config) => permute::to_caffe(node, config, ctx),
        Operator::Eltwise(config) => eltwise::to_caffe(node, config, ctx),
        Operator::Concat(config) => concat::to_caffe(node, config, ctx),
        Operator::PriorBox(config) => prior_box::to_caffe(node, config, ctx),
        Operator::DetectionOutput(config) => detection_output::to_caffe(node, config, ctx),
        Operator::Sequential(children) => export_sequential(children, ctx),
    }
}
