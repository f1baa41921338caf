use std::path::Path;

use log::{debug, info};
use tract_tflite::prelude::*;

use super::backend::{flatten_scores, ModelBackend};
use super::error::BackendError;
use super::preprocess::{PreprocessedTensor, CHANNELS};

/// TensorFlow Lite backend for compact mobile artifacts.
///
/// The input fact is pinned to `[1, size, size, 3] f32` and the graph is
/// optimized once at load time.
pub struct TfliteBackend {
    plan: TypedRunnableModel<TypedModel>,
    input_size: usize,
    output_len: Option<usize>,
}

impl TfliteBackend {
    pub fn load(model_path: &Path, input_size: u32) -> Result<Self, BackendError> {
        std::fs::metadata(model_path)?;

        let model = tract_tflite::tflite()
            .model_for_path(model_path)
            .map_err(|e| BackendError::Unsupported(format!("TFLite parse error: {}", e)))?;

        let side = input_size as usize;
        let fact = TypedFact::dt_shape(f32::datum_type(), tvec!(1, side, side, CHANNELS));
        let model = model
            .with_input_fact(0, fact)
            .and_then(|m| m.into_optimized())
            .map_err(|e| BackendError::Unsupported(format!("TFLite graph rejected: {}", e)))?;

        let output_len = model
            .output_fact(0)
            .ok()
            .and_then(|f| f.shape.as_concrete().and_then(|s| s.last().copied()));

        let plan = model
            .into_runnable()
            .map_err(|e| BackendError::Runtime(format!("TFLite plan failed: {}", e)))?;
        info!("TFLite model optimized for {}x{} input", side, side);

        Ok(Self { plan, input_size: side, output_len })
    }
}

impl ModelBackend for TfliteBackend {
    fn infer(&self, input: &PreprocessedTensor) -> Result<Vec<f32>, BackendError> {
        let side = self.input_size;
        let tensor = Tensor::from_shape(&[1, side, side, CHANNELS], &input.to_vec())
            .map_err(|e| BackendError::Runtime(format!("Failed to create input tensor: {}", e)))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| BackendError::Runtime(format!("Failed to run TFLite model: {}", e)))?;
        let first = outputs
            .first()
            .ok_or_else(|| BackendError::Runtime("Model produced no outputs".into()))?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| BackendError::Runtime(format!("Output is not f32: {}", e)))?;
        debug!("TFLite output shape: {:?}", view.shape());

        flatten_scores(view.shape(), view.iter())
    }

    fn output_len(&self) -> Option<usize> {
        self.output_len
    }

    fn name(&self) -> &str {
        "tflite"
    }
}
