#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use super::BlobShape;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvolutionParameter {
    pub num_output: u32,
    pub bias_term: bool,
    pub pad: Vec<u32>,
    pub kernel_size: Vec<u32>,
    pub stride: Vec<u32>,
    pub dilation: Vec<u32>,
    pub pad_h: u32,
    pub pad_w: u32,
    pub kernel_h: u32,
    pub kernel_w: u32,
    pub stride_h: u32,
    pub stride_w: u32,
    pub group: u32,
}

impl Default for ConvolutionParameter {
    fn default() -> Self {
        Self {
            num_output: 0,
            bias_term: true,
            pad: Vec::new(),
            kernel_size: Vec::new(),
            stride: Vec::new(),
            dilation: Vec::new(),
            pad_h: 0,
            pad_w: 0,
            kernel_h: 0,
            kernel_w: 0,
            stride_h: 0,
            stride_w: 0,
            group: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolMethod {
    #[default]
    Max,
    Ave,
    Stochastic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundMode {
    #[default]
    Ceil,
    Floor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolingParameter {
    pub pool: PoolMethod,
    pub pad: u32,
    pub pad_h: u32,
    pub pad_w: u32,
    pub kernel_size: u32,
    pub kernel_h: u32,
    pub kernel_w: u32,
    pub stride: u32,
    pub stride_h: u32,
    pub stride_w: u32,
    pub global_pooling: bool,
    pub round_mode: RoundMode,
}

impl Default for PoolingParameter {
    fn default() -> Self {
        Self {
            pool: PoolMethod::Max,
            pad: 0,
            pad_h: 0,
            pad_w: 0,
            kernel_size: 0,
            kernel_h: 0,
            kernel_w: 0,
            stride: 1,
            stride_h: 0,
            stride_w: 0,
            global_pooling: false,
            round_mode: RoundMode::Ceil,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InnerProductParameter {
    pub num_output: u32,
    pub bias_term: bool,
    pub axis: i32,
    pub transpose: bool,
}

impl Default for InnerProductParameter {
    fn default() -> Self {
        Self {
            num_output: 0,
            bias_term: true,
            axis: 1,
            transpose: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchNormParameter {
    pub use_global_stats: Option<bool>,
    pub moving_average_fraction: f32,
    pub eps: f32,
}

impl Default for BatchNormParameter {
    fn default() -> Self {
        Self {
            use_global_stats: None,
            moving_average_fraction: 0.999,
            eps: 1e-5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleParameter {
    pub axis: i32,
    pub num_axes: i32,
    pub bias_term: bool,
}

impl Default for ScaleParameter {
    fn default() -> Self {
        Self {
            axis: 1,
            num_axes: 1,
            bias_term: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasParameter {
    pub axis: i32,
    pub num_axes: i32,
}

impl Default for BiasParameter {
    fn default() -> Self {
        Self {
            axis: 1,
            num_axes: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileParameter {
    pub axis: i32,
    pub tiles: i32,
}

impl Default for TileParameter {
    fn default() -> Self {
        Self { axis: 1, tiles: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeParameter {
    pub across_spatial: bool,
    pub channel_shared: bool,
    pub eps: f32,
}

impl Default for NormalizeParameter {
    fn default() -> Self {
        Self {
            across_spatial: true,
            channel_shared: true,
            eps: 1e-10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermuteParameter {
    pub order: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorBoxParameter {
    pub min_size: Vec<f32>,
    pub max_size: Vec<f32>,
    pub aspect_ratio: Vec<f32>,
    pub flip: bool,
    pub clip: bool,
    pub variance: Vec<f32>,
    pub img_size: u32,
    pub img_h: u32,
    pub img_w: u32,
    pub step: f32,
    pub step_h: f32,
    pub step_w: f32,
    pub offset: f32,
}

impl Default for PriorBoxParameter {
    fn default() -> Self {
        Self {
            min_size: Vec::new(),
            max_size: Vec::new(),
            aspect_ratio: Vec::new(),
            flip: true,
            clip: false,
            variance: Vec::new(),
            img_size: 0,
            img_h: 0,
            img_w: 0,
            step: 0.0,
            step_h: 0.0,
            step_w: 0.0,
            offset: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodeType {
    #[default]
    Corner,
    CenterSize,
    CornerSize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonMaximumSuppressionParameter {
    pub nms_threshold: f32,
    pub top_k: Option<i32>,
    pub eta: f32,
}

impl Default for NonMaximumSuppressionParameter {
    fn default() -> Self {
        Self {
            nms_threshold: 0.3,
            top_k: None,
            eta: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionOutputParameter {
    pub num_classes: u32,
    pub share_location: bool,
    pub background_label_id: i32,
    pub nms_param: Option<NonMaximumSuppressionParameter>,
    pub code_type: CodeType,
    pub variance_encoded_in_target: bool,
    pub keep_top_k: i32,
    pub confidence_threshold: Option<f32>,
}

impl Default for DetectionOutputParameter {
    fn default() -> Self {
        Self {
            num_classes: 0,
            share_location: true,
            background_label_id: 0,
            nms_param: None,
            code_type: CodeType::Corner,
            variance_encoded_in_target: false,
            keep_top_k: -1,
            confidence_threshold: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EltwiseOp {
    Prod,
    #[default]
    Sum,
    Max,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EltwiseParameter {
    pub operation: EltwiseOp,
    pub coeff: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcatParameter {
    pub axis: i32,
    pub concat_dim: Option<u32>,
}

impl Default for ConcatParameter {
    fn default() -> Self {
        Self {
            axis: 1,
            concat_dim: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenParameter {
    pub axis: i32,
    pub end_axis: i32,
}

impl Default for FlattenParameter {
    fn default() -> Self {
        Self {
            axis: 1,
            end_axis: -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReshapeParameter {
    pub shape: Option<BlobShape>,
    pub axis: i32,
    pub num_axes: i32,
}

impl Default for ReshapeParameter {
    fn default() -> Self {
        Self {
            shape: None,
            axis: 0,
            num_axes: -1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NormRegion {
    #[default]
    AcrossChannels,
    WithinChannel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LrnParameter {
    pub local_size: u32,
    pub alpha: f32,
    pub beta: f32,
    pub norm_region: NormRegion,
    pub k: f32,
}

impl Default for LrnParameter {
    fn default() -> Self {
        Self {
            local_size: 5,
            alpha: 1.0,
            beta: 0.75,
            norm_region: NormRegion::AcrossChannels,
            k: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropoutParameter {
    pub dropout_ratio: f32,
}

impl Default for DropoutParameter {
    fn default() -> Self {
        Self { dropout_ratio: 0.5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EluParameter {
    pub alpha: f32,
}

impl Default for EluParameter {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerParameter {
    pub power: f32,
    pub scale: f32,
    pub shift: f32,
}

impl Default for PowerParameter {
    fn default() -> Self {
        Self {
            power: 1.0,
            scale: 1.0,
            shift: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PReluParameter {
    pub channel_shared: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReluParameter {
    pub negative_slope: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdParameter {
    pub threshold: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftmaxParameter {
    pub axis: i32,
}

impl Default for SoftmaxParameter {
    fn default() -> Self {
        Self { axis: 1 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputParameter {
    pub shape: Vec<BlobShape>,
}
