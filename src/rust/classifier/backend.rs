use std::fmt;
use std::path::Path;

use log::info;

use super::error::{BackendError, LoadError};
use super::onnx::OnnxBackend;
use super::preprocess::PreprocessedTensor;
use crate::runtime::RuntimeConfig;

/// A deserialized model able to run one forward pass.
///
/// Implementations must be safe to call from several threads at once; a
/// backend whose runtime forbids concurrent use of one handle serializes
/// internally.
pub trait ModelBackend: Send + Sync {
    /// Runs the model on a `[1, H, W, 3]` tensor and returns one score per
    /// class.
    fn infer(&self, input: &PreprocessedTensor) -> Result<Vec<f32>, BackendError>;

    /// Number of scores the model emits, when the graph declares it.
    fn output_len(&self) -> Option<usize> {
        None
    }

    /// Short human-readable backend name
    fn name(&self) -> &str;
}

impl fmt::Debug for dyn ModelBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBackend").field("name", &self.name()).finish()
    }
}

/// Which runtime deserializes the artifact. Chosen when the engine is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Pick from the file extension: `.tflite` uses TFLite, anything else
    /// ONNX Runtime
    #[default]
    Auto,
    /// ONNX Runtime: full `.onnx` graphs and compact `.ort` mobile artifacts
    Onnx,
    /// TensorFlow Lite flatbuffers (requires the `tflite` feature)
    Tflite,
}

impl BackendKind {
    /// Resolves `Auto` against the artifact path.
    pub fn resolve(self, model_path: &Path) -> BackendKind {
        match self {
            BackendKind::Auto => {
                let is_tflite = model_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("tflite"))
                    .unwrap_or(false);
                if is_tflite {
                    BackendKind::Tflite
                } else {
                    BackendKind::Onnx
                }
            }
            other => other,
        }
    }

    /// Deserializes `model_path` into a ready-to-run backend.
    pub fn load(
        self,
        model_path: &Path,
        runtime_config: &RuntimeConfig,
        input_size: u32,
    ) -> Result<Box<dyn ModelBackend>, LoadError> {
        let kind = self.resolve(model_path);
        info!("Loading model artifact {:?} with {:?} backend", model_path, kind);
        match kind {
            BackendKind::Onnx | BackendKind::Auto => {
                let backend = OnnxBackend::load(model_path, runtime_config)
                    .map_err(|e| LoadError::from_backend(model_path, e))?;
                Ok(Box::new(backend))
            }
            BackendKind::Tflite => load_tflite(model_path, input_size),
        }
    }
}

#[cfg(feature = "tflite")]
fn load_tflite(model_path: &Path, input_size: u32) -> Result<Box<dyn ModelBackend>, LoadError> {
    let backend = super::tflite::TfliteBackend::load(model_path, input_size)
        .map_err(|e| LoadError::from_backend(model_path, e))?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "tflite"))]
fn load_tflite(model_path: &Path, _input_size: u32) -> Result<Box<dyn ModelBackend>, LoadError> {
    Err(LoadError::ArtifactIncompatible {
        path: model_path.to_path_buf(),
        message: "TFLite artifacts need the `tflite` feature".to_string(),
    })
}

/// Flattens a `[N]` or `[1, N]` output into a score vector.
pub(crate) fn flatten_scores<'a, I>(shape: &[usize], values: I) -> Result<Vec<f32>, BackendError>
where
    I: IntoIterator<Item = &'a f32>,
{
    let batch_ok = match shape {
        [_] => true,
        [1, _] => true,
        _ => false,
    };
    if !batch_ok {
        return Err(BackendError::Runtime(format!(
            "expected output of shape [N] or [1, N], got {:?}",
            shape
        )));
    }
    Ok(values.into_iter().copied().collect())
}
