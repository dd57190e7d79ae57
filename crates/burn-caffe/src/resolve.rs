//! Effective geometry of a layer from its declared fields.
//!
//! The wire format allows the same quantity to be spelled several ways: explicit per-axis
//! fields (`kernel_h`/`kernel_w`), a repeated field shared by both axes (`kernel_size`), the
//! legacy blob geometry, or nothing at all. Every fallback rule lives here so that extractors
//! only ever see resolved values.
//!
//! Pairs are always `[h, w]`.

use crate::blob::blob_dims;
use crate::caffe::{BlobProto, ConvolutionParameter};
use crate::error::ConvertError;

/// Resolved convolution geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvGeometry {
    pub kernel: [usize; 2],
    pub stride: [usize; 2],
    pub pad: [usize; 2],
    /// `None` when the layer is not dilated.
    pub dilation: Option<[usize; 2]>,
    pub group: usize,
}

/// Channel counts read off a convolution weight blob.
///
/// For a plain convolution `leading` is the output and `trailing` the input channel count;
/// a deconvolution stores its weight the other way round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCounts {
    /// Dimension 0 (or legacy `num`).
    pub leading: usize,
    /// Dimension 1 (or legacy `channels`) multiplied by the group count.
    pub trailing: usize,
}

/// Explicit per-axis values when both are non-zero, otherwise the first entry of the shared
/// list applied to both axes.
pub fn resolve_pair(h: u32, w: u32, shared: &[u32]) -> Option<[usize; 2]> {
    if h != 0 && w != 0 {
        return Some([h as usize, w as usize]);
    }
    shared.first().map(|&v| [v as usize, v as usize])
}

/// Kernel size, falling back to the trailing spatial dimensions of the weight.
pub fn resolve_kernel(param: &ConvolutionParameter, weight: Option<&BlobProto>) -> Option<[usize; 2]> {
    resolve_pair(param.kernel_h, param.kernel_w, &param.kernel_size).or_else(|| {
        let dims = blob_dims(weight?)?;
        match dims.len() {
            n if n >= 4 => Some([dims[n - 2], dims[n - 1]]),
            _ => None,
        }
    })
}

/// Stride, 1 on both axes when nothing is declared.
pub fn resolve_stride(param: &ConvolutionParameter) -> [usize; 2] {
    resolve_pair(param.stride_h, param.stride_w, &param.stride).unwrap_or([1, 1])
}

/// Padding, 0 on both axes when nothing is declared.
pub fn resolve_pad(param: &ConvolutionParameter) -> [usize; 2] {
    resolve_pair(param.pad_h, param.pad_w, &param.pad).unwrap_or([0, 0])
}

/// Dilation, `None` when the list is empty or starts with 1.
pub fn resolve_dilation(dilation: &[u32]) -> Option<[usize; 2]> {
    match dilation {
        [] | [1, ..] => None,
        [d] => Some([*d as usize, *d as usize]),
        [h, w, ..] => Some([*h as usize, *w as usize]),
    }
}

/// A declared group of 0 means 1.
pub fn resolve_group(group: u32) -> usize {
    if group == 0 { 1 } else { group as usize }
}

/// Channel counts of a convolution weight, from its shape or its legacy geometry.
pub fn resolve_channels(weight: &BlobProto, group: usize) -> Option<ChannelCounts> {
    match &weight.shape {
        Some(shape) if shape.dim.len() >= 2 => Some(ChannelCounts {
            leading: usize::try_from(shape.dim[0]).ok()?,
            trailing: usize::try_from(shape.dim[1]).ok()? * group,
        }),
        Some(_) => None,
        None if weight.legacy_is_unset() => None,
        None => Some(ChannelCounts {
            leading: usize::try_from(weight.num).ok()?,
            trailing: usize::try_from(weight.channels).ok()? * group,
        }),
    }
}

/// Resolve every geometric field of a convolution layer at once.
pub fn resolve_conv(
    layer: &str,
    param: &ConvolutionParameter,
    weight: &BlobProto,
) -> Result<(ConvGeometry, ChannelCounts), ConvertError> {
    let group = resolve_group(param.group);
    let kernel = resolve_kernel(param, Some(weight)).ok_or_else(|| {
        ConvertError::malformed(layer, "no kernel size declared and none derivable from the weight")
    })?;
    let channels = resolve_channels(weight, group).ok_or_else(|| {
        ConvertError::malformed(layer, "weight blob has neither a shape nor legacy geometry")
    })?;

    let geometry = ConvGeometry {
        kernel,
        stride: resolve_stride(param),
        pad: resolve_pad(param),
        dilation: resolve_dilation(&param.dilation),
        group,
    };

    Ok((geometry, channels))
}
