//! Conversion between wire blobs and in-memory parameter tensors.
//!
//! The wire format stores single precision values. Export always narrows to `f32`: a tensor
//! held in double precision loses its extra bits here and nowhere else. On import a blob
//! carrying `double_data` decodes to an `f64` tensor.

use crate::caffe::{BlobProto, BlobShape, LayerParameter};
use crate::error::ConvertError;
use crate::tensor::ParamTensor;

/// The dimensions a blob declares: its explicit shape when present, otherwise the legacy
/// `(num, channels, height, width)` quadruple. `None` when neither is set or a dimension is
/// negative.
pub fn blob_dims(blob: &BlobProto) -> Option<Vec<usize>> {
    match &blob.shape {
        Some(shape) => shape
            .dim
            .iter()
            .map(|&d| usize::try_from(d).ok())
            .collect(),
        None if blob.legacy_is_unset() => None,
        None => [blob.num, blob.channels, blob.height, blob.width]
            .iter()
            .map(|&d| usize::try_from(d).ok())
            .collect(),
    }
}

/// Decode a blob into a tensor.
///
/// A blob without any declared geometry becomes a vector of its data length.
pub fn blob_to_tensor(layer: &str, blob: &BlobProto) -> Result<ParamTensor, ConvertError> {
    let dims = match blob_dims(blob) {
        Some(dims) => dims,
        None if blob.shape.is_none() && blob.legacy_is_unset() => vec![blob.len()],
        None => return Err(ConvertError::malformed(layer, "blob declares a negative dimension")),
    };

    let tensor = if blob.data.is_empty() && !blob.double_data.is_empty() {
        ParamTensor::new(blob.double_data.clone(), dims)
    } else {
        ParamTensor::from_f32(blob.data.clone(), dims)
    };

    tensor.map_err(|err| ConvertError::shape(layer, err))
}

/// Encode a tensor as a blob with an explicit shape and single precision data.
pub fn tensor_to_blob(tensor: &ParamTensor) -> BlobProto {
    BlobProto {
        shape: Some(BlobShape::from_dims(tensor.shape())),
        data: tensor.to_f32_vec(),
        ..Default::default()
    }
}

/// The blob at `index`, failing when the layer does not carry it.
pub fn required_blob(layer: &LayerParameter, index: usize) -> Result<&BlobProto, ConvertError> {
    layer
        .blob(index)
        .ok_or_else(|| ConvertError::missing_blob(&layer.name, index))
}

/// The blob at `index` decoded, failing when the layer does not carry it.
pub fn required_tensor(layer: &LayerParameter, index: usize) -> Result<ParamTensor, ConvertError> {
    blob_to_tensor(&layer.name, required_blob(layer, index)?)
}

/// The blob at `index` decoded, if present.
pub fn optional_tensor(
    layer: &LayerParameter,
    index: usize,
) -> Result<Option<ParamTensor>, ConvertError> {
    layer
        .blob(index)
        .map(|blob| blob_to_tensor(&layer.name, blob))
        .transpose()
}
