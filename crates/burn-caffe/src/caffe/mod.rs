//! Rust mirror of the Caffe layer schema.
//!
//! The field layout follows `caffe.proto` (and the SSD extensions for `Normalize`, `Permute`,
//! `PriorBox` and `DetectionOutput`). Decoding the container itself (prototxt, binary protobuf,
//! JSON) is left to an external codec: these types derive serde so any such codec can produce
//! or consume them directly.
//!
//! Every record carries the schema defaults in its `Default` implementation, so a codec only
//! needs to fill in the fields that are present on the wire.

mod blob;
mod params;

pub use blob::*;
pub use params::*;

use serde::{Deserialize, Serialize};

/// A whole network: an ordered list of layers plus the legacy net-level inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetParameter {
    /// Network name.
    pub name: String,
    /// Legacy net-level input names (pre `Input` layer models).
    pub input: Vec<String>,
    /// Shapes matching `input`, one per name.
    pub input_shape: Vec<BlobShape>,
    /// Layers in declaration order.
    pub layer: Vec<LayerParameter>,
}

/// A single layer description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerParameter {
    /// Layer name, unique within a network.
    pub name: String,
    /// Declared layer type, e.g. `Convolution`.
    #[serde(rename = "type")]
    pub layer_type: String,
    /// Input blob names.
    pub bottom: Vec<String>,
    /// Output blob names.
    pub top: Vec<String>,
    /// Learned parameter blobs.
    pub blobs: Vec<BlobProto>,

    pub batch_norm_param: Option<BatchNormParameter>,
    pub bias_param: Option<BiasParameter>,
    pub concat_param: Option<ConcatParameter>,
    pub convolution_param: Option<ConvolutionParameter>,
    pub detection_output_param: Option<DetectionOutputParameter>,
    pub dropout_param: Option<DropoutParameter>,
    pub eltwise_param: Option<EltwiseParameter>,
    pub elu_param: Option<EluParameter>,
    pub flatten_param: Option<FlattenParameter>,
    pub inner_product_param: Option<InnerProductParameter>,
    pub input_param: Option<InputParameter>,
    pub lrn_param: Option<LrnParameter>,
    pub norm_param: Option<NormalizeParameter>,
    pub permute_param: Option<PermuteParameter>,
    pub pooling_param: Option<PoolingParameter>,
    pub power_param: Option<PowerParameter>,
    pub prelu_param: Option<PReluParameter>,
    pub prior_box_param: Option<PriorBoxParameter>,
    pub relu_param: Option<ReluParameter>,
    pub reshape_param: Option<ReshapeParameter>,
    pub scale_param: Option<ScaleParameter>,
    pub softmax_param: Option<SoftmaxParameter>,
    pub threshold_param: Option<ThresholdParameter>,
    pub tile_param: Option<TileParameter>,
}

impl LayerParameter {
    /// Create a layer with a name and a declared type, everything else defaulted.
    pub fn new(name: impl Into<String>, layer_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layer_type: layer_type.into(),
            ..Default::default()
        }
    }

    /// The blob at `index`, if present.
    pub fn blob(&self, index: usize) -> Option<&BlobProto> {
        self.blobs.get(index)
    }
}
