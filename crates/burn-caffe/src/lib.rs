//! `burn-caffe` converts between Caffe layer descriptions and an in-memory operator graph.
//!
//! Import turns an ordered list of [`LayerParameter`](caffe::LayerParameter)s (or a whole
//! [`NetParameter`](caffe::NetParameter)) into a [`Graph`](ir::Graph) of typed operator nodes
//! owning their learned tensors. Export walks a graph, or a single node, and produces the
//! equivalent layers with generated top names.
//!
//! Decoding the container format (prototxt, binary protobuf) is not part of this crate: the
//! schema types in [`caffe`] derive serde so that any codec can produce them.
//!
//! ```
//! use burn_caffe::{Converter, caffe::LayerParameter};
//!
//! let mut relu = LayerParameter::new("relu1", "ReLU");
//! relu.bottom.push("data".into());
//! relu.top.push("relu1".into());
//!
//! let converter = Converter::new();
//! let graph = converter.import_layers(&[relu]).unwrap();
//! assert_eq!(graph.nodes.len(), 2);
//!
//! let layers = converter.export_graph(&graph).unwrap();
//! assert_eq!(layers[1].layer_type, "ReLU");
//! ```

pub mod blob;
pub mod caffe;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod from_caffe;
pub mod ir;
pub mod logger;
pub mod node;
pub mod resolve;
pub mod tensor;
pub mod to_caffe;

pub use config::ConverterConfig;
pub use error::ConvertError;
pub use ir::{Graph, Node, Operator, OperatorKind};
pub use tensor::ParamTensor;

use caffe::{LayerParameter, NetParameter};
use logger::init_log;

/// Entry point for both conversion directions.
///
/// Every pass is independent: the converter only holds configuration.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    /// Create a new `Converter` with the default configuration.
    pub fn new() -> Self {
        init_log().ok(); // Error when init multiple times are ignored.
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: ConverterConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the layer name prefix marking flat (non-spatial) layers.
    pub fn flat_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.config.flat_name_prefix = prefix.to_string();
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert an ordered layer list into a graph.
    pub fn import_layers(&self, layers: &[LayerParameter]) -> Result<Graph, ConvertError> {
        from_caffe::import_layers(layers, &self.config)
    }

    /// Convert a network, declaring its net-level inputs first.
    pub fn import_net(&self, net: &NetParameter) -> Result<Graph, ConvertError> {
        from_caffe::import_net(net, &self.config)
    }

    /// Convert a single layer. Its bottoms are used verbatim as node inputs.
    pub fn import_layer(&self, layer: &LayerParameter) -> Result<from_caffe::Extracted, ConvertError> {
        from_caffe::import_layer(layer, &self.config)
    }

    /// Emit the layers for one node fed by `bottoms`, exposing `fan_out` tops.
    pub fn export_node(
        &self,
        node: &Node,
        bottoms: &[String],
        fan_out: usize,
    ) -> Result<Vec<LayerParameter>, ConvertError> {
        to_caffe::export_node(node, bottoms, fan_out, &self.config)
    }

    /// Emit every node of a graph.
    pub fn export_graph(&self, graph: &Graph) -> Result<Vec<LayerParameter>, ConvertError> {
        to_caffe::export_graph(graph, &self.config)
    }

    /// Emit a graph as a named network.
    pub fn export_net(&self, name: &str, graph: &Graph) -> Result<NetParameter, ConvertError> {
        Ok(NetParameter {
            name: name.to_string(),
            layer: self.export_graph(graph)?,
            ..Default::default()
        })
    }
}
