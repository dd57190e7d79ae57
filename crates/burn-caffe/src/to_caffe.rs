//! Operator graph to layer list.
//!
//! A node named `n` with fan-out `f` produces tops `n0 .. n{f-1}` (at least one); the k-th
//! consumer of `n` reads top `k`, or the last top when there are fewer tops than consumers.
//! Input placeholders are the exception and expose a single top named after the node.

use std::collections::HashMap;

use crate::caffe::LayerParameter;
use crate::config::ConverterConfig;
use crate::dispatch::{self, LayerType};
use crate::error::ConvertError;
use crate::ir::{Graph, Node};

/// What a synthesizer sees besides the node itself.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExportContext<'a> {
    /// Bottom blob names for the first emitted layer.
    pub bottoms: &'a [String],
    /// Number of tops the last emitted layer must expose.
    pub fan_out: usize,
    pub config: &'a ConverterConfig,
}

impl<'a> ExportContext<'a> {
    /// Context for a layer fed by `bottoms` inside a multi-layer emission.
    pub(crate) fn chained<'b>(&self, bottoms: &'b [String], fan_out: usize) -> ExportContext<'b>
    where
        'a: 'b,
    {
        ExportContext {
            bottoms,
            fan_out,
            config: self.config,
        }
    }

    /// A fresh layer wired with this context's bottoms and tops.
    pub(crate) fn layer(&self, name: &str, layer_type: LayerType) -> LayerParameter {
        let mut layer = LayerParameter::new(name, layer_type.as_str());
        layer.bottom = self.bottoms.to_vec();
        layer.top = top_names(name, self.fan_out);
        layer
    }
}

/// Top names for a layer called `name` feeding `fan_out` consumers.
pub fn top_names(name: &str, fan_out: usize) -> Vec<String> {
    (0..fan_out.max(1)).map(|i| format!("{name}{i}")).collect()
}

/// Emit the layers for a single node.
pub fn export_node(
    node: &Node,
    bottoms: &[String],
    fan_out: usize,
    config: &ConverterConfig,
) -> Result<Vec<LayerParameter>, ConvertError> {
    log::debug!(
        "Exporting node {} ({}) with fan-out {fan_out}",
        node.name,
        node.kind()
    );
    let ctx = ExportContext {
        bottoms,
        fan_out,
        config,
    };
    dispatch::synthesize(node, &ctx)
}

/// Emit the children of a sequential container, each fed by the previous child's tops.
pub(crate) fn export_sequential(
    children: &[Node],
    ctx: &ExportContext,
) -> Result<Vec<LayerParameter>, ConvertError> {
    let mut layers = Vec::new();
    let mut bottoms = ctx.bottoms.to_vec();

    for (index, child) in children.iter().enumerate() {
        let fan_out = if index + 1 == children.len() {
            ctx.fan_out
        } else {
            1
        };
        let produced = dispatch::synthesize(child, &ctx.chained(&bottoms, fan_out))?;
        if let Some(last) = produced.last() {
            bottoms = last.top.clone();
        }
        layers.extend(produced);
    }

    Ok(layers)
}

/// Emit every node of a graph, in graph order.
///
/// Fails with [`ConvertError::DanglingInput`] when a node names an input that no earlier node
/// produces.
pub fn export_graph(graph: &Graph, config: &ConverterConfig) -> Result<Vec<LayerParameter>, ConvertError> {
    log::info!("Exporting graph with {} nodes", graph.nodes.len());

    let consumers = graph.consumer_counts();
    let mut tops: HashMap<&str, Vec<String>> = HashMap::new();
    let mut taken: HashMap<&str, usize> = HashMap::new();
    let mut layers = Vec::new();

    for node in &graph.nodes {
        let mut bottoms = Vec::with_capacity(node.inputs.len());
        for input in &node.inputs {
            let available = tops
                .get(input.as_str())
                .filter(|available| !available.is_empty())
                .ok_or_else(|| ConvertError::DanglingInput {
                    node: node.name.clone(),
                    input: input.clone(),
                })?;
            let slot = taken.entry(input.as_str()).or_insert(0);
            bottoms.push(available[(*slot).min(available.len() - 1)].clone());
            *slot += 1;
        }

        let fan_out = consumers.get(node.name.as_str()).copied().unwrap_or(0);
        let produced = export_node(node, &bottoms, fan_out, config)?;
        let exposed = match produced.last() {
            Some(last) => last.top.clone(),
            None => bottoms,
        };
        tops.insert(node.name.as_str(), exposed);
        layers.extend(produced);
    }

    log::info!("Exported {} layers", layers.len());
    Ok(layers)
}
