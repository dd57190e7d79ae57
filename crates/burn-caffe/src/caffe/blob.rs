use serde::{Deserialize, Serialize};

/// Dimension list of a blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobShape {
    /// Dimensions, outermost first.
    pub dim: Vec<i64>,
}

impl BlobShape {
    /// Build a shape from unsigned dimensions.
    pub fn from_dims(dims: &[usize]) -> Self {
        Self {
            dim: dims.iter().map(|&d| d as i64).collect(),
        }
    }
}

/// A numeric parameter tensor as stored on the wire.
///
/// Newer models describe the geometry with `shape`. Older ones use the four legacy
/// `num`/`channels`/`height`/`width` fields instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobProto {
    pub shape: Option<BlobShape>,
    pub data: Vec<f32>,
    pub double_data: Vec<f64>,

    // Legacy 4D geometry.
    pub num: i32,
    pub channels: i32,
    pub height: i32,
    pub width: i32,
}

impl BlobProto {
    /// Blob with an explicit shape and single precision data.
    pub fn new(dims: &[usize], data: Vec<f32>) -> Self {
        Self {
            shape: Some(BlobShape::from_dims(dims)),
            data,
            ..Default::default()
        }
    }

    /// Blob using the legacy `(num, channels, height, width)` geometry.
    pub fn legacy(num: i32, channels: i32, height: i32, width: i32, data: Vec<f32>) -> Self {
        Self {
            shape: None,
            data,
            num,
            channels,
            height,
            width,
            ..Default::default()
        }
    }

    /// Number of values carried, whichever precision is used.
    pub fn len(&self) -> usize {
        if self.data.is_empty() {
            self.double_data.len()
        } else {
            self.data.len()
        }
    }

    /// Whether the blob carries no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether all four legacy geometry fields are unset.
    pub fn legacy_is_unset(&self) -> bool {
        self.num == 0 && self.channels == 0 && self.height == 0 && self.width == 0
    }
}
