use crate::caffe::{LayerParameter, PriorBoxParameter};
use crate::dispatch::LayerType;
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::{Node, Operator};
use crate::to_caffe::ExportContext;

/// Configuration for SSD default box generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorBoxConfig {
    pub min_sizes: Vec<f32>,
    pub max_sizes: Vec<f32>,
    pub aspect_ratios: Vec<f32>,
    /// Whether the reciprocal of every aspect ratio is added.
    pub flip: bool,
    /// Whether boxes are clipped to the image.
    pub clip: bool,
    pub variances: Vec<f32>,
    /// Image size `[h, w]`, `[0, 0]` to infer it from the input.
    pub img_size: [usize; 2],
    /// Step `[h, w]`, `[0.0, 0.0]` to infer it from the feature map.
    pub step: [f32; 2],
    /// Offset of the box centers within a cell.
    pub offset: f32,
}

pub(crate) fn from_caffe(
    layer: &LayerParameter,
    ctx: &ImportContext,
) -> Result<Extracted, ConvertError> {
    let param = layer.prior_box_param.clone().unwrap_or_default();

    let img_size = if param.img_h != 0 && param.img_w != 0 {
        [param.img_h as usize, param.img_w as usize]
    } else {
        [param.img_size as usize; 2]
    };
    let step = if param.step_h != 0.0 && param.step_w != 0.0 {
        [param.step_h, param.step_w]
    } else {
        [param.step; 2]
    };

    let config = PriorBoxConfig {
        min_sizes: param.min_size,
        max_sizes: param.max_size,
        aspect_ratios: param.aspect_ratio,
        flip: param.flip,
        clip: param.clip,
        variances: param.variance,
        img_size,
        step,
        offset: param.offset,
    };
    log::debug!("PriorBox {} config: {config:?}", layer.name);

    Ok(Extracted::single(
        Node::new(&layer.name, Operator::PriorBox(config)).with_inputs(ctx.inputs.clone()),
    ))
}

pub(crate) fn to_caffe(
    node: &Node,
    config: &PriorBoxConfig,
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut param = PriorBoxParameter {
        min_size: config.min_sizes.clone(),
        max_size: config.max_sizes.clone(),
        aspect_ratio: config.aspect_ratios.clone(),
        flip: config.flip,
        clip: config.clip,
        variance: config.variances.clone(),
        offset: config.offset,
        ..Default::default()
    };

    let [img_h, img_w] = config.img_size;
    if img_h == img_w {
        param.img_size = img_h as u32;
    } else {
        (param.img_h, param.img_w) = (img_h as u32, img_w as u32);
    }
    let [step_h, step_w] = config.step;
    if step_h == step_w {
        param.step = step_h;
    } else {
        (param.step_h, param.step_w) = (step_h, step_w);
    }

    let mut layer = ctx.layer(&node.name, LayerType::PriorBox);
    layer.prior_box_param = Some(param);
    Ok(vec![layer])
}
