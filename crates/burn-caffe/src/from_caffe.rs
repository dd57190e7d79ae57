//! Layer list to operator graph.
//!
//! Layers are converted one at a time, in declaration order. Each layer's bottoms are looked up
//! in a map from blob name to the node currently producing it; the layer's tops are then
//! rebound to the node(s) the layer produced. Since a top may be rebound, in-place layers
//! (`bottom == top`) chain naturally.

use std::collections::HashMap;

use crate::caffe::{LayerParameter, NetParameter};
use crate::config::ConverterConfig;
use crate::dispatch::{self, LayerType};
use crate::error::ConvertError;
use crate::ir::{Graph, Node, Operator};
use crate::node::input::InputConfig;

/// What an extractor sees besides the layer itself.
#[derive(Debug)]
pub(crate) struct ImportContext<'a> {
    /// Producer node names, one per bottom.
    pub inputs: Vec<String>,
    /// Producer operators, aligned with `inputs`. Empty when the layer is converted alone.
    pub input_ops: Vec<&'a Operator>,
    pub config: &'a ConverterConfig,
}

impl ImportContext<'_> {
    /// Operator of the producer feeding input `index`, when known.
    pub(crate) fn input_op(&self, index: usize) -> Option<&Operator> {
        self.input_ops.get(index).copied()
    }
}

/// How a layer's tops map onto the nodes it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    /// Every top is produced by the last node.
    Primary,
    /// The i-th top is produced by the i-th node.
    PerTop,
}

/// The nodes produced from one layer, producers before consumers.
#[derive(Debug)]
pub struct Extracted {
    nodes: Vec<Node>,
    binding: Binding,
}

impl Extracted {
    /// A single node.
    pub(crate) fn single(node: Node) -> Self {
        Self {
            nodes: vec![node],
            binding: Binding::Primary,
        }
    }

    /// `head` followed by `tail`, each node of the tail fed by the one before it. The last
    /// node is the primary.
    pub(crate) fn chain(head: Node, tail: impl IntoIterator<Item = Node>) -> Self {
        let mut nodes = vec![head];
        for node in tail {
            let previous = nodes[nodes.len() - 1].name.clone();
            nodes.push(node.with_inputs(vec![previous]));
        }
        Self {
            nodes,
            binding: Binding::Primary,
        }
    }

    /// Independent nodes, one per top.
    pub(crate) fn per_top(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            binding: Binding::PerTop,
        }
    }

    /// The node the layer's tops resolve to.
    pub fn primary(&self) -> Option<&Node> {
        self.nodes.last()
    }

    /// Every produced node.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn bindings(&self, tops: &[String]) -> Vec<(String, String)> {
        match self.binding {
            Binding::Primary => match self.primary() {
                Some(primary) => tops
                    .iter()
                    .map(|top| (top.clone(), primary.name.clone()))
                    .collect(),
                None => Vec::new(),
            },
            Binding::PerTop => tops
                .iter()
                .zip(&self.nodes)
                .map(|(top, node)| (top.clone(), node.name.clone()))
                .collect(),
        }
    }
}

/// Mutable state of one import pass.
pub(crate) struct ImportPass<'a> {
    config: &'a ConverterConfig,
    graph: Graph,
    /// Blob name to the node currently producing it.
    producers: HashMap<String, String>,
}

impl<'a> ImportPass<'a> {
    pub(crate) fn new(config: &'a ConverterConfig) -> Self {
        Self {
            config,
            graph: Graph::default(),
            producers: HashMap::new(),
        }
    }

    /// Add an input placeholder producing the blob `name`.
    pub(crate) fn declare_input(&mut self, name: &str, shape: Option<Vec<usize>>) {
        log::debug!("Declaring input {name} with shape {shape:?}");
        let node = Node::new(name, Operator::Input(InputConfig::new(shape)));
        self.producers.insert(name.to_string(), name.to_string());
        self.graph.nodes.push(node);
    }

    /// Convert one layer and wire it into the graph.
    pub(crate) fn push_layer(&mut self, layer: &LayerParameter) -> Result<(), ConvertError> {
        let layer_type = LayerType::parse(&layer.layer_type)?;
        log::debug!(
            "Converting layer {} of type {} ({layer_type:?})",
            layer.name,
            layer.layer_type
        );

        let mut inputs = Vec::with_capacity(layer.bottom.len());
        for bottom in &layer.bottom {
            if !self.producers.contains_key(bottom) {
                log::debug!("Bottom {bottom} of {} has no producer, adding input", layer.name);
                self.declare_input(bottom, None);
            }
            if let Some(producer) = self.producers.get(bottom) {
                inputs.push(producer.clone());
            }
        }

        let input_ops = inputs
            .iter()
            .filter_map(|name| self.graph.node(name).map(|node| &node.op))
            .collect();
        let ctx = ImportContext {
            inputs,
            input_ops,
            config: self.config,
        };
        let extracted = dispatch::extract(layer_type, layer, &ctx)?;

        for (top, node) in extracted.bindings(&layer.top) {
            self.producers.insert(top, node);
        }
        self.graph.nodes.extend(extracted.nodes);

        Ok(())
    }

    pub(crate) fn finish(self) -> Graph {
        log::info!("Imported graph with {} nodes", self.graph.nodes.len());
        self.graph
    }
}

/// Convert a single layer in isolation.
///
/// Bottoms become the node inputs verbatim; nothing is resolved.
pub fn import_layer(
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

/// Convert an ordered layer list into a graph.
pub fn import_layers(
    layers: &[LayerParameter],
    config: &ConverterConfig,
) -> Result<Graph, ConvertError> {
    log::info!("Importing {} layers", layers.len());

    let mut pass = ImportPass::new(config);
    for layer in layers {
        pass.push_layer(layer)?;
    }
    Ok(pass.finish())
}

/// Convert a whole network, including its legacy net-level inputs.
pub fn import_net(net: &NetParameter, config: &ConverterConfig) -> Result<Graph, ConvertError> {
    log::info!("Importing net {} with {} layers", net.name, net.layer.len());

    let mut pass = ImportPass::new(config);
    for (index, name) in net.input.iter().enumerate() {
        let shape = match net.input_shape.get(index) {
            Some(shape) => Some(
                shape
                    .dim
                    .iter()
                    .map(|&d| usize::try_from(d))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| ConvertError::malformed(name, "negative input dimension"))?,
            ),
            None => None,
        };
        pass.declare_input(name, shape);
    }
    for layer in &net.layer {
        pass.push_layer(layer)?;
    }
    Ok(pass.finish())
}
