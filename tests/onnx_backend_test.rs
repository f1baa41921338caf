mod common;

use std::io::Write;

use common::graph::{nhwc_classifier, pooled_softmax, write_model, Dim};
use common::*;
use leafsense::artifact::sha256_file;
use leafsense::classifier::{preprocess, OnnxBackend};
use leafsense::{
    BackendError, ClassifierBuilder, ClassifierEngine, EngineState, LoadError, ModelBackend,
    RuntimeConfig,
};

const GRAPE: [&str; 4] = [
    "Grape___Black_rot",
    "Grape___Esca_(Black_Measles)",
    "Grape___Leaf_blight_(Isariopsis_Leaf_Spot)",
    "Grape___healthy",
];

fn grape_table() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "class_index,class").unwrap();
    for (i, name) in GRAPE.iter().enumerate() {
        writeln!(file, "{},{}", i, name).unwrap();
    }
    file.flush().unwrap();
    file
}

fn argmax(scores: &[f32]) -> usize {
    scores
        .iter()
        .enumerate()
        .fold(0, |best, (i, s)| if *s > scores[best] { i } else { best })
}

#[test]
fn test_loads_nhwc_model_and_reports_output_len() {
    let model = write_model(&nhwc_classifier(4), ".onnx");
    let backend = OnnxBackend::load(model.path(), &RuntimeConfig::default()).unwrap();
    assert_eq!(backend.output_len(), Some(4));
    assert_eq!(backend.name(), "onnxruntime");
}

#[test]
fn test_forward_pass_returns_probabilities() {
    let model = write_model(&nhwc_classifier(4), ".onnx");
    let backend = OnnxBackend::load(model.path(), &RuntimeConfig::default()).unwrap();

    let red = backend.infer(&preprocess(&solid_image(300, 200, [255, 0, 0]))).unwrap();
    assert_eq!(red.len(), 4);
    assert!(red.iter().all(|s| s.is_finite() && *s >= 0.0));
    assert!((red.iter().sum::<f32>() - 1.0).abs() < 1e-4);
    assert_eq!(argmax(&red), 3);

    let blue = backend.infer(&preprocess(&solid_image(64, 64, [0, 0, 255]))).unwrap();
    assert_eq!(argmax(&blue), 0);
}

#[test]
fn test_rejects_nchw_input() {
    let bytes = pooled_softmax(
        &[Dim::Symbolic("batch"), Dim::Fixed(3), Dim::Fixed(224), Dim::Fixed(224)],
        &[2, 3],
        4,
    );
    let model = write_model(&bytes, ".onnx");
    let err = OnnxBackend::load(model.path(), &RuntimeConfig::default()).unwrap_err();
    assert!(matches!(err, BackendError::Unsupported(ref msg) if msg.contains("NHWC")), "{}", err);
}

#[test]
fn test_rejects_non_image_rank() {
    let bytes = pooled_softmax(&[Dim::Symbolic("batch"), Dim::Fixed(3)], &[], 4);
    let model = write_model(&bytes, ".onnx");
    let err = OnnxBackend::load(model.path(), &RuntimeConfig::default()).unwrap_err();
    assert!(matches!(err, BackendError::Unsupported(ref msg) if msg.contains("rank 4")), "{}", err);
}

#[test]
fn test_accepts_symbolic_spatial_dims() {
    let bytes = pooled_softmax(
        &[Dim::Symbolic("batch"), Dim::Symbolic("h"), Dim::Symbolic("w"), Dim::Fixed(3)],
        &[1, 2],
        4,
    );
    let model = write_model(&bytes, ".onnx");
    assert!(OnnxBackend::load(model.path(), &RuntimeConfig::default()).is_ok());
}

#[test]
fn test_engine_classifies_with_onnx_model() {
    let model = write_model(&nhwc_classifier(4), ".onnx");
    let labels = grape_table();
    let engine = ClassifierBuilder::new()
        .with_model_checksum(sha256_file(model.path()).unwrap())
        .build_and_load(model.path(), labels.path())
        .unwrap();

    let top = engine.classify(&solid_image(224, 224, [255, 0, 0]), 10).unwrap();
    assert_eq!(top.len(), 4);
    assert_eq!(top[0].raw_name, "Grape___healthy");
    assert!(top[0].is_healthy);
    assert_eq!(top[3].condition, "Black rot");

    let info = engine.info().unwrap();
    assert_eq!(info.backend, "onnxruntime");
    assert_eq!(info.num_classes, 4);
}

#[test]
fn test_class_count_mismatch_fails_load() {
    let model = write_model(&nhwc_classifier(4), ".onnx");
    let labels = write_label_table();
    let mut engine = ClassifierEngine::default();
    let err = engine.load(model.path(), labels.path()).unwrap_err();
    assert!(matches!(err, LoadError::ArtifactIncompatible { ref message, .. } if message.contains("38")));
    assert_eq!(engine.state(), EngineState::Failed);
}

#[test]
fn test_corrupt_artifact_is_incompatible() {
    let model = write_model(b"\x08\x07 definitely not a protobuf graph", ".onnx");
    let labels = grape_table();
    let mut engine = ClassifierEngine::default();
    let err = engine.load(model.path(), labels.path()).unwrap_err();
    assert!(matches!(err, LoadError::ArtifactIncompatible { .. }));
}
