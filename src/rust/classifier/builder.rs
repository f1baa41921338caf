use std::path::Path;

use super::backend::BackendKind;
use super::classifier::ClassifierEngine;
use super::error::LoadError;
use super::TrainingInfo;
use super::preprocess::INPUT_SIZE;
use crate::runtime::RuntimeConfig;

/// A builder for constructing a [`ClassifierEngine`] with a fluent interface.
///
/// The builder only gathers configuration; no file is touched until
/// [`ClassifierEngine::load`] runs.
#[derive(Debug)]
pub struct ClassifierBuilder {
    runtime_config: RuntimeConfig,
    backend_kind: BackendKind,
    expected_sha256: Option<String>,
    input_size: u32,
    training: TrainingInfo,
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBuilder {
    /// Creates a builder with ONNX Runtime defaults, backend picked from the
    /// artifact extension and a 224x224 input.
    ///
    /// # Example
    /// ```
    /// use leafsense::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            runtime_config: RuntimeConfig::default(),
            backend_kind: BackendKind::Auto,
            expected_sha256: None,
            input_size: INPUT_SIZE,
            training: TrainingInfo::default(),
        }
    }

    /// Sets the runtime configuration for ONNX model execution
    ///
    /// # Example
    /// ```
    /// use leafsense::{ClassifierBuilder, RuntimeConfig};
    ///
    /// let config = RuntimeConfig::with_intra_threads(2);
    /// let builder = ClassifierBuilder::new()
    ///     .with_runtime_config(config);
    /// ```
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Forces a backend instead of choosing by file extension.
    pub fn with_backend(mut self, kind: BackendKind) -> Self {
        self.backend_kind = kind;
        self
    }

    /// Requires the model artifact to hash to `sha256` (hex) before it is
    /// deserialized.
    pub fn with_model_checksum(mut self, sha256: impl Into<String>) -> Self {
        self.expected_sha256 = Some(sha256.into());
        self
    }

    /// Overrides the square input side length. Values below 1 are raised to 1.
    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size.max(1);
        self
    }

    /// Replaces the training recipe reported by [`ClassifierEngine::info`].
    pub fn with_training_info(mut self, training: TrainingInfo) -> Self {
        self.training = training;
        self
    }

    /// Builds an engine in the `Unloaded` state.
    pub fn build(self) -> ClassifierEngine {
        ClassifierEngine::from_parts(
            self.runtime_config,
            self.backend_kind,
            self.expected_sha256,
            self.input_size,
            self.training,
        )
    }

    /// Builds the engine and loads it.
    ///
    /// # Example
    /// ```no_run
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use leafsense::{BackendKind, ClassifierBuilder};
    ///
    /// let engine = ClassifierBuilder::new()
    ///     .with_backend(BackendKind::Onnx)
    ///     .build_and_load("prediction_model.onnx", "class_dict.csv")?;
    /// assert_eq!(engine.num_classes(), 38);
    /// # Ok(())
    /// # }
    /// ```
    pub fn build_and_load(
        self,
        model_path: impl AsRef<Path>,
        label_table_path: impl AsRef<Path>,
    ) -> Result<ClassifierEngine, LoadError> {
        let mut engine = self.build();
        engine.load(model_path, label_table_path)?;
        Ok(engine)
    }
}
