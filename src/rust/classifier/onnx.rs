use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use log::{debug, info, warn};
use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::{Tensor, ValueType};

use super::backend::{flatten_scores, ModelBackend};
use super::error::BackendError;
use super::preprocess::{PreprocessedTensor, CHANNELS};
use crate::runtime::{create_session_builder, RuntimeConfig};

/// ONNX Runtime backend for full `.onnx` graphs and `.ort` mobile artifacts.
///
/// The model is expected to:
/// - Accept one `f32` input of shape `[batch, height, width, 3]` (NHWC)
/// - Produce one output of shape `[batch, num_classes]`
///
/// The session sits behind a mutex so concurrent callers take turns on the
/// handle.
#[derive(Debug)]
pub struct OnnxBackend {
    session: Mutex<Session>,
    input_name: String,
    output_len: Option<usize>,
}

impl OnnxBackend {
    pub fn load(model_path: &Path, config: &RuntimeConfig) -> Result<Self, BackendError> {
        // Surface a missing or unreadable file as I/O rather than a graph error
        std::fs::metadata(model_path)?;

        let session = create_session_builder(config)?.commit_from_file(model_path)?;
        let (input_name, output_len) = Self::validate_model(&session)?;
        info!(
            "ONNX model validated: input '{}', {} outputs",
            input_name,
            output_len.map_or_else(|| "dynamic".to_string(), |n| n.to_string())
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_len,
        })
    }

    /// Checks the model has one NHWC float image input and at least one
    /// output. Returns the input name and the static class count if known.
    fn validate_model(session: &Session) -> Result<(String, Option<usize>), BackendError> {
        let input = session.inputs.first().ok_or_else(|| {
            BackendError::Unsupported("Model must have at least 1 input for the image".into())
        })?;
        if session.inputs.len() > 1 {
            warn!(
                "Model declares {} inputs; only '{}' will be fed",
                session.inputs.len(),
                input.name
            );
        }

        match &input.input_type {
            ValueType::Tensor { ty, dimensions, .. } => {
                if *ty != TensorElementType::Float32 {
                    return Err(BackendError::Unsupported(format!(
                        "Image input must be float32, found {:?}",
                        ty
                    )));
                }
                if dimensions.len() != 4 {
                    return Err(BackendError::Unsupported(format!(
                        "Image input must be rank 4 (NHWC), found shape {:?}",
                        dimensions
                    )));
                }
                let channels = dimensions[3];
                if channels != CHANNELS as i64 && channels >= 0 {
                    return Err(BackendError::Unsupported(format!(
                        "Image input must have 3 trailing channels (NHWC), found shape {:?}",
                        dimensions
                    )));
                }
            }
            other => {
                return Err(BackendError::Unsupported(format!(
                    "Image input must be a tensor, found {:?}",
                    other
                )));
            }
        }

        let output = session.outputs.first().ok_or_else(|| {
            BackendError::Unsupported("Model must have at least 1 output for class scores".into())
        })?;
        let output_len = match &output.output_type {
            ValueType::Tensor { dimensions, .. } => dimensions
                .last()
                .and_then(|&d| usize::try_from(d).ok())
                .filter(|&d| d > 0),
            _ => None,
        };

        Ok((input.name.clone(), output_len))
    }
}

impl ModelBackend for OnnxBackend {
    fn infer(&self, input: &PreprocessedTensor) -> Result<Vec<f32>, BackendError> {
        let input_dyn = input.as_array().clone().into_dyn();
        let input_values = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input_values).map_err(|e| {
                BackendError::Runtime(format!("Failed to create input tensor: {}", e))
            })?,
        );

        let session = self
            .session
            .lock()
            .map_err(|_| BackendError::Runtime("ONNX session lock poisoned".into()))?;
        let outputs = session
            .run(input_tensors)
            .map_err(|e| BackendError::Runtime(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
            BackendError::Runtime(format!("Failed to extract output tensor: {}", e))
        })?;
        debug!("ONNX output shape: {:?}", output_tensor.shape());

        flatten_scores(output_tensor.shape(), output_tensor.iter())
    }

    fn output_len(&self) -> Option<usize> {
        self.output_len
    }

    fn name(&self) -> &str {
        "onnxruntime"
    }
}
