//! Writes tiny ONNX graphs for backend tests.
//!
//! Only the handful of protobuf fields the graphs below need are emitted:
//! `ModelProto`, `GraphProto`, `NodeProto`, `AttributeProto`, `TensorProto`
//! and `ValueInfoProto`.

use std::io::Write;

const WIRE_VARINT: u64 = 0;
const WIRE_LEN: u64 = 2;
const FLOAT: i64 = 1;
const ATTR_INT: i64 = 2;
const ATTR_INTS: i64 = 7;

/// One axis of a declared tensor shape
#[derive(Debug, Clone, Copy)]
pub enum Dim {
    Fixed(i64),
    Symbolic(&'static str),
}

fn varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn int_field(out: &mut Vec<u8>, field: u64, value: i64) {
    varint(out, (field << 3) | WIRE_VARINT);
    varint(out, value as u64);
}

fn bytes_field(out: &mut Vec<u8>, field: u64, data: &[u8]) {
    varint(out, (field << 3) | WIRE_LEN);
    varint(out, data.len() as u64);
    out.extend_from_slice(data);
}

fn value_info(name: &str, dims: &[Dim]) -> Vec<u8> {
    let mut shape = Vec::new();
    for dim in dims {
        let mut d = Vec::new();
        match dim {
            Dim::Fixed(v) => int_field(&mut d, 1, *v),
            Dim::Symbolic(s) => bytes_field(&mut d, 2, s.as_bytes()),
        }
        bytes_field(&mut shape, 1, &d);
    }
    let mut tensor_type = Vec::new();
    int_field(&mut tensor_type, 1, FLOAT);
    bytes_field(&mut tensor_type, 2, &shape);
    let mut type_proto = Vec::new();
    bytes_field(&mut type_proto, 1, &tensor_type);

    let mut out = Vec::new();
    bytes_field(&mut out, 1, name.as_bytes());
    bytes_field(&mut out, 2, &type_proto);
    out
}

fn initializer(name: &str, dims: &[i64], values: &[f32]) -> Vec<u8> {
    let mut out = Vec::new();
    for d in dims {
        int_field(&mut out, 1, *d);
    }
    int_field(&mut out, 2, FLOAT);
    bytes_field(&mut out, 8, name.as_bytes());
    let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    bytes_field(&mut out, 9, &raw);
    out
}

fn ints_attribute(name: &str, values: &[i64]) -> Vec<u8> {
    let mut out = Vec::new();
    bytes_field(&mut out, 1, name.as_bytes());
    for v in values {
        int_field(&mut out, 8, *v);
    }
    int_field(&mut out, 20, ATTR_INTS);
    out
}

fn int_attribute(name: &str, value: i64) -> Vec<u8> {
    let mut out = Vec::new();
    bytes_field(&mut out, 1, name.as_bytes());
    int_field(&mut out, 3, value);
    int_field(&mut out, 20, ATTR_INT);
    out
}

fn node(op: &str, inputs: &[&str], outputs: &[&str], attributes: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for i in inputs {
        bytes_field(&mut out, 1, i.as_bytes());
    }
    for o in outputs {
        bytes_field(&mut out, 2, o.as_bytes());
    }
    bytes_field(&mut out, 4, op.as_bytes());
    for a in attributes {
        bytes_field(&mut out, 5, a);
    }
    out
}

/// Weights `[3, classes]`: red pushes towards the last class, blue towards
/// the first, green is ignored.
fn channel_weights(classes: usize) -> Vec<f32> {
    let mut w = Vec::with_capacity(3 * classes);
    for channel in 0..3 {
        for k in 0..classes {
            let step = 0.01 * k as f32;
            w.push(match channel {
                0 => step,
                2 => -step,
                _ => 0.0,
            });
        }
    }
    w
}

/// `Softmax(MatMul(ReduceMean(image, pool_axes), W))` over `classes`.
///
/// With empty `pool_axes` the input feeds `MatMul` directly and must be
/// `[batch, 3]`.
pub fn pooled_softmax(input_dims: &[Dim], pool_axes: &[i64], classes: usize) -> Vec<u8> {
    let mut nodes = Vec::new();
    let features = if pool_axes.is_empty() {
        "image"
    } else {
        nodes.push(node(
            "ReduceMean",
            &["image"],
            &["pooled"],
            &[ints_attribute("axes", pool_axes), int_attribute("keepdims", 0)],
        ));
        "pooled"
    };
    nodes.push(node("MatMul", &[features, "weights"], &["logits"], &[]));
    nodes.push(node("Softmax", &["logits"], &["scores"], &[int_attribute("axis", -1)]));

    let mut graph = Vec::new();
    for n in &nodes {
        bytes_field(&mut graph, 1, n);
    }
    bytes_field(&mut graph, 2, b"leaf-test");
    bytes_field(
        &mut graph,
        5,
        &initializer("weights", &[3, classes as i64], &channel_weights(classes)),
    );
    bytes_field(&mut graph, 11, &value_info("image", input_dims));
    bytes_field(
        &mut graph,
        12,
        &value_info("scores", &[Dim::Symbolic("batch"), Dim::Fixed(classes as i64)]),
    );

    let mut opset = Vec::new();
    int_field(&mut opset, 2, 13);

    let mut model = Vec::new();
    int_field(&mut model, 1, 7);
    bytes_field(&mut model, 2, b"leafsense-tests");
    bytes_field(&mut model, 7, &graph);
    bytes_field(&mut model, 8, &opset);
    model
}

/// NHWC `[batch, 224, 224, 3]` classifier over `classes`.
pub fn nhwc_classifier(classes: usize) -> Vec<u8> {
    pooled_softmax(
        &[Dim::Symbolic("batch"), Dim::Fixed(224), Dim::Fixed(224), Dim::Fixed(3)],
        &[1, 2],
        classes,
    )
}

/// Writes `bytes` to a temp file ending in `suffix`.
pub fn write_model(bytes: &[u8], suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
