use crate::caffe::{
    CodeType, DetectionOutputParameter, LayerParameter, NonMaximumSuppressionParameter,
};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::to_caffe::ExportContext;

/// Configuration for SSD detection decoding and non-maximum suppression.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOutputConfig {
    /// Number of classes, background included.
    pub num_classes: usize,
    /// Whether box locations are shared across classes.
    pub share_location: bool,
    /// Label of the background class.
    pub background_label: i32,
    /// Overlap threshold for suppression.
    pub nms_threshold: f32,
    /// Candidates kept per class before suppression.
    pub nms_top_k: Option<i32>,
    /// Adaptive threshold factor.
    pub nms_eta: f32,
    /// Detections kept per image after suppression, -1 for all.
    pub keep_top_k: i32,
    /// Minimum score; `None` keeps every candidate.
    pub confidence_threshold: Option<f32>,
    /// Encoding of the box offsets.
    pub code_type: CodeType,
    /// Whether the variances are already folded into the predictions.
    pub variance_encoded_in_target: bool,
}

pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.detection_output_param.clone().unwrap_or_default();
    let nms = param.nms_param.unwrap_or_default();

    let config = DetectionOutputConfig {
        num_classes: param.num_classes as usize,
        share_location: param.share_location,
        background_label: param.background_label_id,
        nms_threshold: nms.nms_threshold,
        nms_top_k: nms.top_k,
        nms_eta: nms.eta,
        keep_top_k: param.keep_top_k,
        confidence_threshold: param.confidence_threshold,
        code_type: param.code_type,
        variance_encoded_in_target: param.variance_encoded_in_target,
    };
    log::debug!("DetectionOutput {} config: {config:?}", layer.name);

    Ok(Extracted::single(
        Node::new(&layer.name, Operator::DetectionOutput(config)).with_inputs(ctx.inputs.clone()),
    ))
}

pub(crate) fn to_caffe(
    node: &Node,
    config: &DetectionOutputConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layer = ctx.layer(&node.name, LayerType::DetectionOutput);
    layer.detection_output_param = Some(DetectionOutputParameter {
        num_classes: config.num_classes as u32,
        share_location: config.share_location,
        background_label_id: config.background_label,
        nms_param: Some(NonMaximumSuppressionParameter {
            nms_threshold: config.nms_threshold,
            top_k: config.nms_top_k,
            eta: config.nms_eta,
        }),
        code_type: config.code_type,
        variance_encoded_in_target: config.variance_encoded_in_target,
        keep_top_k: config.keep_top_k,
        confidence_threshold: config.confidence_threshold,
    });
    Ok(vec![layer])
}
