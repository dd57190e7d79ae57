use std::collections::HashMap;

use strum::{Display, EnumDiscriminants};

use crate::node::{
    activation::{EluConfig, PReluConfig, PowerConfig, ReluConfig, SoftmaxConfig, ThresholdConfig},
    batch_norm::BatchNormConfig,
    bias::BiasConfig,
    concat::ConcatConfig,
    conv::ConvolutionConfig,
    detection_output::DetectionOutputConfig,
    dropout::DropoutConfig,
    eltwise::EltwiseConfig,
    input::InputConfig,
    linear::LinearConfig,
    lrn::LrnConfig,
    normalize::NormalizeConfig,
    permute::TransposeConfig,
    pooling::PoolingConfig,
    prior_box::PriorBoxConfig,
    reshape::{FlattenConfig, ReshapeConfig},
    scale::ScaleConfig,
    tile::TileConfig,
};
use crate::tensor::ParamTensor;

/// The closed set of operators a graph node can wrap.
///
/// Parameterless operators carry no config. Learned tensors live on the [`Node`] itself,
/// except for the batch-norm running statistics which belong to [`BatchNormConfig`].
#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(OperatorKind), derive(Display, Hash))]
pub enum Operator {
    Input(InputConfig),
    Convolution(ConvolutionConfig),
    FullConvolution(ConvolutionConfig),
    DilatedConvolution(ConvolutionConfig),
    Linear(LinearConfig),
    BatchNorm(BatchNormConfig),
    Relu(ReluConfig),
    Tanh,
    Sigmoid,
    Abs,
    Exp,
    Log,
    Power(PowerConfig),
    Elu(EluConfig),
    PRelu(PReluConfig),
    Threshold(ThresholdConfig),
    Softmax(SoftmaxConfig),
    Dropout(DropoutConfig),
    Lrn(LrnConfig),
    Pooling(PoolingConfig),
    Reshape(ReshapeConfig),
    Flatten(FlattenConfig),
    Scale(ScaleConfig),
    Bias(BiasConfig),
    Tile(TileConfig),
    Normalize(NormalizeConfig),
    Transpose(TransposeConfig),
    Eltwise(EltwiseConfig),
    Concat(ConcatConfig),
    PriorBox(PriorBoxConfig),
    DetectionOutput(DetectionOutputConfig),
    /// A linear chain of nodes; their own `inputs` are ignored and each one feeds the next.
    Sequential(Vec<Node>),
}

impl Operator {
    /// The operator's kind tag.
    pub fn kind(&self) -> OperatorKind {
        OperatorKind::from(self)
    }
}

/// A vertex of the operator graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique node name.
    pub name: String,
    /// The wrapped operator.
    pub op: Operator,
    /// Names of the producer nodes, in input order.
    pub inputs: Vec<String>,
    /// Learned weight, if the operator has one.
    pub weight: Option<ParamTensor>,
    /// Learned bias, if the operator has one.
    pub bias: Option<ParamTensor>,
}

impl Node {
    /// Create a node without inputs or learned tensors.
    pub fn new(name: impl Into<String>, op: Operator) -> Self {
        Self {
            name: name.into(),
            op,
            inputs: Vec::new(),
            weight: None,
            bias: None,
        }
    }

    /// Set the producer names.
    pub fn with_inputs(mut self, inputs: Vec<String>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Attach a learned weight.
    pub fn with_weight(mut self, weight: ParamTensor) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Attach (or clear) a learned bias.
    pub fn with_bias(mut self, bias: Option<ParamTensor>) -> Self {
        self.bias = bias;
        self
    }

    /// The kind of the wrapped operator.
    pub fn kind(&self) -> OperatorKind {
        self.op.kind()
    }
}

/// A directed operator graph.
///
/// Edges are implicit: a node's `inputs` name the nodes producing its inputs. Nodes are kept in
/// the order they were declared, which is a valid topological order for imported graphs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    /// The nodes, producers before consumers.
    pub nodes: Vec<Node>,
}

impl Graph {
    /// Look a node up by name.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Input placeholder nodes.
    pub fn inputs(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|node| matches!(node.op, Operator::Input(_)))
            .collect()
    }

    /// Nodes no other node consumes.
    pub fn outputs(&self) -> Vec<&Node> {
        let counts = self.consumer_counts();
        self.nodes
            .iter()
            .filter(|node| !counts.contains_key(node.name.as_str()))
            .collect()
    }

    /// Nodes consuming `name`, in graph order.
    pub fn consumers(&self, name: &str) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|node| node.inputs.iter().any(|input| input == name))
            .collect()
    }

    /// Number of input slots fed by each producer. A node using the same producer twice
    /// counts twice.
    pub fn consumer_counts(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for node in &self.nodes {
            for input in &node.inputs {
                *counts.entry(input.as_str()).or_insert(0) += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relu(name: &str, inputs: &[&str]) -> Node {
        Node::new(name, Operator::Relu(ReluConfig::default()))
            .with_inputs(inputs.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn outputs_are_unconsumed_nodes() {
        let graph = Graph {
            nodes: vec![
                Node::new("data", Operator::Input(InputConfig::default())),
                relu("a", &["data"]),
                relu("b", &["a"]),
                relu("c", &["a"]),
            ],
        };

        let outputs: Vec<_> = graph.outputs().iter().map(|n| n.name.clone()).collect();
        assert_eq!(outputs, vec!["b", "c"]);
        assert_eq!(graph.inputs().len(), 1);
        assert_eq!(graph.consumers("a").len(), 2);
        assert_eq!(graph.consumer_counts()["a"], 2);
    }

    #[test]
    fn kind_tags_follow_variants() {
        let node = Node::new("t", Operator::Tanh);

        assert_eq!(node.kind(), OperatorKind::Tanh);
        assert_eq!(node.kind().to_string(), "Tanh");
    }
}
