use std::path::PathBuf;

use serde::Serialize;

mod backend;
pub mod builder;
#[allow(clippy::module_inception)]
mod classifier;
mod error;
pub mod labels;
mod onnx;
pub mod preprocess;
#[cfg(feature = "tflite")]
mod tflite;
mod utils;

pub use backend::{BackendKind, ModelBackend};
pub use builder::ClassifierBuilder;
pub use classifier::{ClassifierEngine, EngineState, RankedPrediction};
pub use error::{BackendError, ClassifyError, LoadError};
pub use labels::{format_label, is_healthy_label, join_label, LabelCatalog, LabelEntry};
pub use onnx::OnnxBackend;
pub use preprocess::{preprocess, PreprocessedTensor};
#[cfg(feature = "tflite")]
pub use tflite::TfliteBackend;

/// Information about a loaded classifier
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierInfo {
    /// Path to the model artifact, if loaded from disk
    pub model_path: Option<PathBuf>,
    /// Path to the label table, if loaded from disk
    pub labels_path: Option<PathBuf>,
    /// Name of the backend running the forward pass
    pub backend: String,
    /// Number of classes the model predicts
    pub num_classes: usize,
    /// Raw class names in index order
    pub class_labels: Vec<String>,
    /// Side length of the square model input
    pub input_size: u32,
    pub color_mode: String,
    pub preprocessing: String,
    /// How the model artifact was trained
    pub training: TrainingInfo,
}

/// Training recipe of a model artifact, reported as-is.
///
/// [`TrainingInfo::default`] describes the PlantVillage EfficientNetB3
/// export the crate is built around.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingInfo {
    pub architecture: String,
    pub pretrained_weights: String,
    pub optimizer: String,
    pub learning_rate: f64,
    pub loss_function: String,
    /// Layers stacked on the backbone, input to output
    pub custom_layers: Vec<String>,
    /// Augmentations applied to the training split only
    pub training_augmentation: Vec<String>,
}

impl Default for TrainingInfo {
    fn default() -> Self {
        let strings =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            architecture: "EfficientNetB3".to_string(),
            pretrained_weights: "ImageNet".to_string(),
            optimizer: "Adamax".to_string(),
            learning_rate: 0.001,
            loss_function: "Categorical Crossentropy".to_string(),
            custom_layers: strings(&[
                "BatchNormalization (axis=-1, momentum=0.99, epsilon=0.001)",
                "Dense(256, activation=relu, L2=0.016, L1_activity=0.006, L1_bias=0.006)",
                "Dropout(rate=0.45, seed=123)",
                "Dense(38, activation=softmax)",
            ]),
            training_augmentation: strings(&["Horizontal Flip"]),
        }
    }
}
