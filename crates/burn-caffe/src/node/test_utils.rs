use crate::caffe::{BlobProto, LayerParameter};
use crate::config::ConverterConfig;
use crate::dispatch::{self, LayerType};
use crate::error::ConvertError;
use crate::from_caffe::{Extracted, ImportContext};
use crate::ir::Node;
use crate::to_caffe::ExportContext;

/// Builder for layers under test.
pub(crate) struct LayerBuilder {
    layer: LayerParameter,
}

impl LayerBuilder {
    pub(crate) fn new(name: &str, layer_type: &str) -> Self {
        Self {
            layer: LayerParameter::new(name, layer_type),
        }
    }

    pub(crate) fn bottom(mut self, name: &str) -> Self {
        self.layer.bottom.push(name.to_string());
        self
    }

    pub(crate) fn top(mut self, name: &str) -> Self {
        self.layer.top.push(name.to_string());
        self
    }

    /// Shaped blob holding `0, 1, 2, ...`.
    pub(crate) fn blob(mut self, dims: &[usize]) -> Self {
        self.layer.blobs.push(BlobProto::new(dims, ramp(dims.iter().product())));
        self
    }

    pub(crate) fn blob_data(mut self, dims: &[usize], data: Vec<f32>) -> Self {
        self.layer.blobs.push(BlobProto::new(dims, data));
        self
    }

    pub(crate) fn raw_blob(mut self, blob: BlobProto) -> Self {
        self.layer.blobs.push(blob);
        self
    }

    /// Arbitrary edits, typically setting a parameter record.
    pub(crate) fn with(mut self, edit: impl FnOnce(&mut LayerParameter)) -> Self {
        edit(&mut self.layer);
        self
    }

    pub(crate) fn build(self) -> LayerParameter {
        self.layer
    }
}

pub(crate) fn ramp(len: usize) -> Vec<f32> {
    (0..len).map(|i| i as f32).collect()
}

/// Run the registered extractor with a single `data` producer per bottom.
pub(crate) fn extract(layer: &LayerParameter) -> Result<Extracted, ConvertError> {
    extract_with(layer, &ConverterConfig::default())
}

pub(crate) fn extract_with(
    layer: &LayerParameter,
    config: &ConverterConfig,
) -> Result<Extracted, ConvertError> {
    let layer_type = LayerType::parse(&layer.layer_type)?;
    let ctx = ImportContext {
        inputs: layer.bottom.clone(),
        input_ops: Vec::new(),
        config,
    };
    dispatch::extract(layer_type, layer, &ctx)
}

/// The primary node of a successful extraction.
pub(crate) fn extract_node(layer: &LayerParameter) -> Node {
    extract(layer)
        .unwrap()
        .primary()
        .cloned()
        .expect("extraction produced no node")
}

/// Run the registered synthesizer fed by `bottoms`.
pub(crate) fn synthesize(
    node: &Node,
    bottoms: &[&str],
    fan_out: usize,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let bottoms: Vec<String> = bottoms.iter().map(|s| s.to_string()).collect();
    let config = ConverterConfig::default();
    let ctx = ExportContext {
        bottoms: &bottoms,
        fan_out,
        config: &config,
    };
    dispatch::synthesize(node, &ctx)
}

/// Synthesize a node expected to produce exactly one layer.
pub(crate) fn synthesize_one(node: &Node) -> LayerParameter {
    let mut layers = synthesize(node, &["data"], 1).unwrap();
    assert_eq!(layers.len(), 1, "expected a single layer");
    layers.remove(0)
}
