use burn_caffe::caffe::{
    BlobProto, BlobShape, ConcatParameter, ConvolutionParameter, DetectionOutputParameter,
    DropoutParameter, EltwiseOp, EltwiseParameter, EluParameter, FlattenParameter,
    InputParameter, LayerParameter, LrnParameter, NetParameter, NonMaximumSuppressionParameter,
    NormalizeParameter, PermuteParameter, PoolMethod, PoolingParameter, PowerParameter,
    PriorBoxParameter, ReluParameter, ReshapeParameter, ScaleParameter, SoftmaxParameter,
    ThresholdParameter, TileParameter,
};
use burn_caffe::node::activation::ReluConfig;
use burn_caffe::node::batch_norm::BatchNormConfig;
use burn_caffe::node::conv::ConvolutionConfig;
use burn_caffe::node::linear::LinearConfig;
use burn_caffe::node::reshape::ReshapeConfig;
use burn_caffe::{ConvertError, Converter, Graph, Node, Operator, OperatorKind, ParamTensor};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn fixture() -> NetParameter {
    serde_json::from_str(include_str!("data/tiny_lenet.json")).unwrap()
}

fn layer(name: &str, layer_type: &str, bottom: &[&str], top: &[&str]) -> LayerParameter {
    let mut layer = LayerParameter::new(name, layer_type);
    layer.bottom = bottom.iter().map(|s| s.to_string()).collect();
    layer.top = top.iter().map(|s| s.to_string()).collect();
    layer
}

/// Attach blobs of the given shapes, filled with distinct values.
fn with_blobs(mut layer: LayerParameter, shapes: &[&[usize]]) -> LayerParameter {
    for dims in shapes {
        let len = dims.iter().product::<usize>();
        let data = (0..len).map(|i| i as f32 * 0.25 + 0.5).collect();
        layer.blobs.push(BlobProto::new(dims, data));
    }
    layer
}

fn configured(mut layer: LayerParameter, configure: impl FnOnce(&mut LayerParameter)) -> LayerParameter {
    configure(&mut layer);
    layer
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn kinds(graph: &Graph) -> Vec<OperatorKind> {
    graph.nodes.iter().map(Node::kind).collect()
}

#[test]
fn fixture_imports_as_a_chain() {
    let graph = Converter::new().import_net(&fixture()).unwrap();

    assert_eq!(
        kinds(&graph),
        vec![
            OperatorKind::Input,
            OperatorKind::Convolution,
            OperatorKind::BatchNorm,
            OperatorKind::Relu,
            OperatorKind::Pooling,
            OperatorKind::Reshape,
            OperatorKind::Linear,
            OperatorKind::Softmax,
        ]
    );

    let names: Vec<_> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    for pair in names.windows(2) {
        assert_eq!(graph.node(pair[1]).unwrap().inputs, strings(&[pair[0]]));
    }

    match &graph.node("conv1_bn").unwrap().op {
        Operator::BatchNorm(config) => {
            assert_eq!(config.running_mean.to_f32_vec(), vec![0.25, -0.25]);
            assert_eq!(config.running_var.to_f32_vec(), vec![1.0, 2.0]);
            assert_eq!(config.epsilon, 0.001);
        }
        other => panic!("unexpected operator {other:?}"),
    }
    assert_eq!(graph.outputs().len(), 1);
    assert_eq!(graph.outputs()[0].name, "prob");
}

#[test]
fn fixture_survives_export_and_reimport() {
    let converter = Converter::new();
    let graph = converter.import_net(&fixture()).unwrap();

    let net = converter.export_net("tiny_lenet", &graph).unwrap();
    assert_eq!(net.name, "tiny_lenet");
    assert_eq!(net.layer.len(), graph.nodes.len());

    let reimported = converter.import_net(&net).unwrap();
    assert_eq!(reimported, graph);
}

#[test]
fn exported_net_serializes_like_the_fixture() {
    let converter = Converter::new();
    let net = converter
        .export_net("tiny_lenet", &converter.import_net(&fixture()).unwrap())
        .unwrap();

    let json = serde_json::to_string(&net).unwrap();
    let decoded: NetParameter = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, net);
    assert!(json.contains(r#""type":"Convolution""#));
}

#[test]
fn convolution_end_to_end() {
    let mut conv = layer("conv1", "Convolution", &["data"], &["conv1"]);
    conv.blobs.push(BlobProto::new(&[16, 3, 3, 3], vec![0.5; 432]));
    conv.convolution_param = Some(ConvolutionParameter::default());

    let converter = Converter::new();
    let extracted = converter.import_layer(&conv).unwrap();
    let node = extracted.primary().unwrap();

    assert_eq!(
        node.op,
        Operator::Convolution(ConvolutionConfig::new(3, 16, [3, 3]).with_bias(false))
    );

    let layers = converter.export_node(node, &strings(&["data"]), 1).unwrap();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].bottom, strings(&["data"]));
    assert_eq!(layers[0].top, strings(&["conv10"]));
    assert_eq!(
        layers[0].blobs[0].shape.as_ref().unwrap().dim,
        vec![16, 3, 3, 3]
    );
}

#[test]
fn shared_kernel_size_applies_to_both_axes() {
    let mut conv = layer("conv", "Convolution", &["data"], &["conv"]);
    conv.blobs.push(BlobProto::new(&[4, 2, 5, 5], vec![0.0; 200]));
    conv.convolution_param = Some(ConvolutionParameter {
        kernel_h: 0,
        kernel_w: 0,
        kernel_size: vec![5],
        ..Default::default()
    });

    let node = Converter::new().import_layer(&conv).unwrap();
    match &node.primary().unwrap().op {
        Operator::Convolution(config) => assert_eq!(config.kernel_size, [5, 5]),
        other => panic!("unexpected operator {other:?}"),
    }
}

#[test]
fn zero_batch_norm_factor_is_not_an_error() {
    let mut bn = layer("bn", "BatchNorm", &["x"], &["bn"]);
    bn.blobs = vec![
        BlobProto::new(&[2], vec![3.0, 4.0]),
        BlobProto::new(&[2], vec![5.0, 6.0]),
        BlobProto::new(&[1], vec![0.0]),
    ];

    let extracted = Converter::new().import_layer(&bn).unwrap();
    let Operator::BatchNorm(BatchNormConfig {
        running_mean,
        running_var,
        ..
    }) = &extracted.primary().unwrap().op
    else {
        panic!("expected a batch norm");
    };

    assert_eq!(running_mean.to_f32_vec(), vec![0.0, 0.0]);
    assert_eq!(running_var.to_f32_vec(), vec![0.0, 0.0]);
}

#[test]
fn linear_with_differing_sizes_gains_a_reshape() {
    let mut ip = layer("ip1", "InnerProduct", &["pool2"], &["ip1"]);
    ip.blobs.push(BlobProto::new(&[10, 40], vec![0.1; 400]));

    let graph = Converter::new().import_layers(&[ip]).unwrap();

    assert_eq!(
        kinds(&graph),
        vec![OperatorKind::Input, OperatorKind::Reshape, OperatorKind::Linear]
    );
    assert_eq!(
        graph.nodes[1].op,
        Operator::Reshape(ReshapeConfig::new(vec![40]).with_batch_mode(true))
    );
    assert_eq!(graph.nodes[2].op, Operator::Linear(LinearConfig::new(40, 10).with_bias(false)));
    assert_eq!(graph.nodes[2].inputs, strings(&[graph.nodes[1].name.as_str()]));
}

#[test]
fn unknown_type_discards_the_pass() {
    let mut pool = layer("pool", "Pooling", &["data"], &["pool"]);
    pool.pooling_param = Some(PoolingParameter {
        pool: PoolMethod::Max,
        kernel_size: 2,
        ..Default::default()
    });
    let layers = [pool, layer("crop", "Crop", &["pool", "data"], &["crop"])];

    assert_eq!(
        Converter::new().import_layers(&layers).unwrap_err(),
        ConvertError::UnsupportedOperator("Crop".to_string())
    );
}

#[test]
fn sequential_threads_generated_tops() {
    let conv = Node::new(
        "conv",
        Operator::Convolution(ConvolutionConfig::new(3, 8, [3, 3])),
    )
    .with_weight(ParamTensor::vector(vec![0.0; 8 * 3 * 9]))
    .with_bias(Some(ParamTensor::vector(vec![0.0; 8])));
    let relu = Node::new("relu", Operator::Relu(ReluConfig::default()));
    let block = Node::new("block", Operator::Sequential(vec![conv, relu]));

    let layers = Converter::new()
        .export_node(&block, &strings(&["data"]), 1)
        .unwrap();

    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].bottom, strings(&["data"]));
    assert_eq!(layers[1].bottom, layers[0].top);
    assert_eq!(layers[1].top, strings(&["relu0"]));
}

#[test]
fn fan_out_follows_consumers() {
    let layers = [
        layer("split_src", "ReLU", &["data"], &["a"]),
        layer("left", "TanH", &["a"], &["left"]),
        layer("right", "Sigmoid", &["a"], &["right"]),
        layer("join", "Eltwise", &["left", "right"], &["join"]),
    ];
    let converter = Converter::new();
    let graph = converter.import_layers(&layers).unwrap();
    let exported = converter.export_graph(&graph).unwrap();

    let by_name = |name: &str| exported.iter().find(|l| l.name == name).unwrap();
    assert_eq!(by_name("split_src").top, strings(&["split_src0", "split_src1"]));
    assert_eq!(by_name("left").bottom, strings(&["split_src0"]));
    assert_eq!(by_name("right").bottom, strings(&["split_src1"]));
    assert_eq!(by_name("join").bottom, strings(&["left0", "right0"]));

    assert_eq!(converter.import_layers(&exported).unwrap(), graph);
}

#[test]
fn flat_prefix_is_configurable() {
    let mut bn = layer("dense_bn", "BatchNorm", &["x"], &["dense_bn"]);
    bn.blobs = vec![
        BlobProto::new(&[2], vec![0.0, 0.0]),
        BlobProto::new(&[2], vec![1.0, 1.0]),
        BlobProto::new(&[1], vec![1.0]),
    ];

    let mut converter = Converter::new();
    converter.flat_name_prefix("dense");
    let extracted = converter.import_layer(&bn).unwrap();

    match &extracted.primary().unwrap().op {
        Operator::BatchNorm(config) => assert!(!config.spatial),
        other => panic!("unexpected operator {other:?}"),
    }
}

#[rstest]
#[case::input(configured(layer("data", "Input", &[], &["data"]), |l| {
    l.input_param = Some(InputParameter {
        shape: vec![BlobShape { dim: vec![1, 3, 8, 8] }],
    });
}))]
#[case::convolution(configured(
    with_blobs(layer("conv", "Convolution", &["data"], &["conv"]), &[&[8, 3, 3, 3], &[8]]),
    |l| l.convolution_param = Some(ConvolutionParameter {
        kernel_size: vec![3],
        stride: vec![2],
        pad: vec![1],
        ..Default::default()
    }),
))]
#[case::deconvolution(configured(
    with_blobs(layer("up", "Deconvolution", &["data"], &["up"]), &[&[3, 8, 2, 2]]),
    |l| l.convolution_param = Some(ConvolutionParameter {
        kernel_size: vec![2],
        stride: vec![2],
        bias_term: false,
        ..Default::default()
    }),
))]
#[case::inner_product(with_blobs(layer("ip", "InnerProduct", &["data"], &["ip"]), &[&[10, 40], &[10]]))]
#[case::batch_norm(with_blobs(layer("bn", "BatchNorm", &["data"], &["data"]), &[&[3], &[3], &[1]]))]
#[case::scale(configured(
    with_blobs(layer("scale", "Scale", &["data"], &["data"]), &[&[1, 3, 1, 1]]),
    |l| l.scale_param = Some(ScaleParameter::default()),
))]
#[case::bias(with_blobs(layer("bias", "Bias", &["data"], &["bias"]), &[&[3]]))]
#[case::tile(configured(layer("tile", "Tile", &["data"], &["tile"]), |l| {
    l.tile_param = Some(TileParameter { axis: 1, tiles: 2 });
}))]
#[case::normalize(configured(
    with_blobs(layer("norm", "Normalize", &["data"], &["norm"]), &[&[3]]),
    |l| l.norm_param = Some(NormalizeParameter {
        across_spatial: false,
        channel_shared: false,
        eps: 1e-10,
    }),
))]
#[case::permute(configured(layer("perm", "Permute", &["data"], &["perm"]), |l| {
    l.permute_param = Some(PermuteParameter { order: vec![0, 1, 3, 2] });
}))]
#[case::prior_box(configured(layer("prior", "PriorBox", &["feat", "data"], &["prior"]), |l| {
    l.prior_box_param = Some(PriorBoxParameter {
        min_size: vec![30.0],
        max_size: vec![60.0],
        aspect_ratio: vec![2.0],
        variance: vec![0.1, 0.1, 0.2, 0.2],
        img_h: 300,
        img_w: 200,
        step: 8.0,
        ..Default::default()
    });
}))]
#[case::detection_output(configured(
    layer("detect", "DetectionOutput", &["loc", "conf", "prior"], &["detect"]),
    |l| l.detection_output_param = Some(DetectionOutputParameter {
        num_classes: 21,
        nms_param: Some(NonMaximumSuppressionParameter {
            nms_threshold: 0.45,
            top_k: Some(400),
            ..Default::default()
        }),
        keep_top_k: 200,
        confidence_threshold: Some(0.01),
        ..Default::default()
    }),
))]
#[case::relu(configured(layer("relu", "ReLU", &["data"], &["data"]), |l| {
    l.relu_param = Some(ReluParameter { negative_slope: 0.1 });
}))]
#[case::tanh(layer("tanh", "TanH", &["data"], &["tanh"]))]
#[case::sigmoid(layer("sigmoid", "Sigmoid", &["data"], &["sigmoid"]))]
#[case::abs_val(layer("abs", "AbsVal", &["data"], &["abs"]))]
#[case::exp(layer("exp", "Exp", &["data"], &["exp"]))]
#[case::log(layer("log", "Log", &["data"], &["log"]))]
#[case::power(configured(layer("power", "Power", &["data"], &["power"]), |l| {
    l.power_param = Some(PowerParameter { power: 2.0, scale: 0.5, shift: 1.0 });
}))]
#[case::elu(configured(layer("elu", "ELU", &["data"], &["elu"]), |l| {
    l.elu_param = Some(EluParameter { alpha: 0.5 });
}))]
#[case::prelu(with_blobs(layer("prelu", "PReLU", &["data"], &["prelu"]), &[&[3]]))]
#[case::threshold(configured(layer("thresh", "Threshold", &["data"], &["thresh"]), |l| {
    l.threshold_param = Some(ThresholdParameter { threshold: 0.5 });
}))]
#[case::softmax(configured(layer("prob", "Softmax", &["data"], &["prob"]), |l| {
    l.softmax_param = Some(SoftmaxParameter { axis: 1 });
}))]
#[case::dropout(configured(layer("drop", "Dropout", &["data"], &["data"]), |l| {
    l.dropout_param = Some(DropoutParameter { dropout_ratio: 0.3 });
}))]
#[case::lrn(configured(layer("norm1", "LRN", &["data"], &["norm1"]), |l| {
    l.lrn_param = Some(LrnParameter { local_size: 3, alpha: 1e-4, ..Default::default() });
}))]
#[case::pooling(configured(layer("pool", "Pooling", &["data"], &["pool"]), |l| {
    l.pooling_param = Some(PoolingParameter {
        pool: PoolMethod::Max,
        kernel_size: 3,
        stride: 2,
        ..Default::default()
    });
}))]
#[case::global_pooling(configured(layer("gap", "Pooling", &["data"], &["gap"]), |l| {
    l.pooling_param = Some(PoolingParameter {
        pool: PoolMethod::Ave,
        kernel_size: 7,
        global_pooling: true,
        ..Default::default()
    });
}))]
#[case::eltwise(configured(layer("sum", "Eltwise", &["a", "b"], &["sum"]), |l| {
    l.eltwise_param = Some(EltwiseParameter {
        operation: EltwiseOp::Sum,
        coeff: vec![1.0, -1.0],
    });
}))]
#[case::concat(configured(layer("cat", "Concat", &["a", "b"], &["cat"]), |l| {
    l.concat_param = Some(ConcatParameter { axis: 1, concat_dim: None });
}))]
#[case::flatten(configured(layer("flat", "Flatten", &["data"], &["flat"]), |l| {
    l.flatten_param = Some(FlattenParameter { axis: 1, end_axis: -1 });
}))]
#[case::reshape(configured(layer("reshape", "Reshape", &["data"], &["reshape"]), |l| {
    l.reshape_param = Some(ReshapeParameter {
        shape: Some(BlobShape { dim: vec![0, -1] }),
        ..Default::default()
    });
}))]
fn every_layer_type_survives_export(#[case] fixture: LayerParameter) {
    let converter = Converter::new();
    let graph = converter.import_layers(std::slice::from_ref(&fixture)).unwrap();
    let exported = converter.export_graph(&graph).unwrap();

    assert_eq!(converter.import_layers(&exported).unwrap(), graph);
}
