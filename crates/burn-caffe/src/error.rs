use crate::tensor::ShapeError;

/// Errors produced by a conversion pass.
///
/// Any error aborts the whole pass; a partially built graph or layer list is never returned.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConvertError {
    /// A layer needs a parameter blob that it does not carry.
    #[error("layer `{layer}` is missing required blob #{index}")]
    MissingRequiredBlob {
        /// Name of the offending layer.
        layer: String,
        /// Position of the missing blob.
        index: usize,
    },

    /// The layer type or node operator has no registered converter.
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// A blob or declared dimension list cannot be reconciled with its data.
    #[error("malformed shape in `{layer}`: {detail}")]
    MalformedShape {
        /// Name of the offending layer or node.
        layer: String,
        /// What did not match.
        detail: String,
    },

    /// A node names an input that has not been produced earlier in the graph.
    #[error("node `{node}` references unknown input `{input}`")]
    DanglingInput {
        /// Consumer node.
        node: String,
        /// Missing producer.
        input: String,
    },
}

impl ConvertError {
    pub(crate) fn missing_blob(layer: impl Into<String>, index: usize) -> Self {
        ConvertError::MissingRequiredBlob {
            layer: layer.into(),
            index,
        }
    }

    pub(crate) fn unsupported(name: impl Into<String>) -> Self {
        ConvertError::UnsupportedOperator(name.into())
    }

    pub(crate) fn malformed(layer: impl Into<String>, detail: impl Into<String>) -> Self {
        ConvertError::MalformedShape {
            layer: layer.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn shape(layer: impl Into<String>, err: ShapeError) -> Self {
        Self::malformed(layer, err.to_string())
    }
}
