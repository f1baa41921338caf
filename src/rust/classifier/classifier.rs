use std::path::{Path, PathBuf};
use std::time::Instant;

use image::DynamicImage;
use log::{debug, error, info};
use serde::Serialize;

use super::backend::{BackendKind, ModelBackend};
use super::error::{ClassifyError, LoadError};
use super::labels::{LabelCatalog, LabelEntry};
use super::preprocess::{preprocess_with_size, PreprocessedTensor};
use super::utils::top_k_indices;
use super::{ClassifierInfo, TrainingInfo};
use crate::artifact::verify_artifact;
use crate::runtime::RuntimeConfig;

/// Lifecycle of a [`ClassifierEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Unloaded,
    Loaded,
    Failed,
}

/// One ranked, annotated class of a classification result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPrediction {
    pub class_index: usize,
    pub raw_name: String,
    pub species: String,
    pub condition: String,
    pub is_healthy: bool,
    /// Model score in `[0, 1]`
    pub confidence: f32,
    /// `confidence * 100`
    pub confidence_percent: f32,
}

impl RankedPrediction {
    fn new(entry: LabelEntry, score: f32) -> Self {
        Self {
            class_index: entry.index,
            raw_name: entry.raw_name,
            species: entry.species,
            condition: entry.condition,
            is_healthy: entry.is_healthy,
            confidence: score,
            confidence_percent: score * 100.0,
        }
    }
}

/// Model and catalog retained once `load` succeeds.
#[derive(Debug)]
struct LoadedModel {
    backend: Box<dyn ModelBackend>,
    catalog: LabelCatalog,
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
}

#[derive(Debug)]
enum Slot {
    Unloaded,
    Loaded(LoadedModel),
    Failed(String),
}

/// Single-model, single-image leaf classifier.
///
/// Built in the `Unloaded` state; [`ClassifierEngine::load`] moves it to
/// `Loaded` or `Failed`. Only a loaded engine classifies.
///
/// # Thread Safety
///
/// After `load` the engine is read-only, so it can be shared behind an `Arc`
/// and `classify` called from many threads:
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use leafsense::ClassifierEngine;
/// use std::sync::Arc;
/// use std::thread;
///
/// let engine = Arc::new(ClassifierEngine::open("model.onnx", "class_dict.csv")?);
/// let image = image::open("leaf.jpg")?;
///
/// let engine_clone = Arc::clone(&engine);
/// thread::spawn(move || {
///     let top = engine_clone.classify(&image, 5).unwrap();
///     println!("{} / {}", top[0].species, top[0].condition);
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ClassifierEngine {
    runtime_config: RuntimeConfig,
    backend_kind: BackendKind,
    expected_sha256: Option<String>,
    input_size: u32,
    training: TrainingInfo,
    slot: Slot,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ClassifierEngine>();
    }
};

impl Default for ClassifierEngine {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClassifierEngine {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    pub(crate) fn from_parts(
        runtime_config: RuntimeConfig,
        backend_kind: BackendKind,
        expected_sha256: Option<String>,
        input_size: u32,
        training: TrainingInfo,
    ) -> Self {
        Self {
            runtime_config,
            backend_kind,
            expected_sha256,
            input_size,
            training,
            slot: Slot::Unloaded,
        }
    }

    /// Builds a default engine and loads it in one step.
    pub fn open(
        model_path: impl AsRef<Path>,
        label_table_path: impl AsRef<Path>,
    ) -> Result<Self, LoadError> {
        let mut engine = Self::default();
        engine.load(model_path, label_table_path)?;
        Ok(engine)
    }

    /// Deserializes the model artifact, then loads the label table.
    ///
    /// On success the engine is `Loaded`. On any failure it is `Failed` and
    /// nothing from the attempt is visible to `classify`. Calling `load`
    /// again retries from scratch.
    pub fn load(
        &mut self,
        model_path: impl AsRef<Path>,
        label_table_path: impl AsRef<Path>,
    ) -> Result<(), LoadError> {
        let model_path = model_path.as_ref();
        let label_table_path = label_table_path.as_ref();
        let start = Instant::now();

        let result = self
            .load_backend(model_path)
            .and_then(|backend| {
                let catalog = LabelCatalog::load(label_table_path)?;
                Ok((backend, catalog))
            })
            .and_then(|(backend, catalog)| {
                Self::check_compatible(backend.as_ref(), &catalog, model_path)?;
                Ok(LoadedModel {
                    backend,
                    catalog,
                    model_path: Some(model_path.to_path_buf()),
                    labels_path: Some(label_table_path.to_path_buf()),
                })
            });

        match result {
            Ok(loaded) => {
                info!(
                    "Classifier loaded: {} classes via {} (took {:.2?})",
                    loaded.catalog.size(),
                    loaded.backend.name(),
                    start.elapsed()
                );
                self.slot = Slot::Loaded(loaded);
                Ok(())
            }
            Err(e) => {
                error!("Failed to load classifier: {}", e);
                self.slot = Slot::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Loads from an already constructed backend and catalog.
    ///
    /// Same state transitions as [`ClassifierEngine::load`]; used to plug in
    /// custom runtimes.
    pub fn load_with_backend(
        &mut self,
        backend: Box<dyn ModelBackend>,
        catalog: LabelCatalog,
    ) -> Result<(), LoadError> {
        let placeholder = PathBuf::from(format!("<{}>", backend.name()));
        match Self::check_compatible(backend.as_ref(), &catalog, &placeholder) {
            Ok(()) => {
                info!("Classifier loaded: {} classes via {}", catalog.size(), backend.name());
                self.slot = Slot::Loaded(LoadedModel {
                    backend,
                    catalog,
                    model_path: None,
                    labels_path: None,
                });
                Ok(())
            }
            Err(e) => {
                error!("Failed to load classifier: {}", e);
                self.slot = Slot::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn load_backend(&self, model_path: &Path) -> Result<Box<dyn ModelBackend>, LoadError> {
        if let Some(expected) = &self.expected_sha256 {
            verify_artifact(model_path, expected)?;
        }
        self.backend_kind
            .load(model_path, &self.runtime_config, self.input_size)
    }

    fn check_compatible(
        backend: &dyn ModelBackend,
        catalog: &LabelCatalog,
        model_path: &Path,
    ) -> Result<(), LoadError> {
        match backend.output_len() {
            Some(n) if n != catalog.size() => Err(LoadError::ArtifactIncompatible {
                path: model_path.to_path_buf(),
                message: format!(
                    "model emits {} scores but the label table has {} classes",
                    n,
                    catalog.size()
                ),
            }),
            _ => Ok(()),
        }
    }

    pub fn state(&self) -> EngineState {
        match self.slot {
            Slot::Unloaded => EngineState::Unloaded,
            Slot::Loaded(_) => EngineState::Loaded,
            Slot::Failed(_) => EngineState::Failed,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.slot, Slot::Loaded(_))
    }

    /// Message of the last failed load, if the engine is `Failed`.
    pub fn failure(&self) -> Option<&str> {
        match &self.slot {
            Slot::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    fn loaded(&self) -> Result<&LoadedModel, ClassifyError> {
        match &self.slot {
            Slot::Loaded(loaded) => Ok(loaded),
            _ => Err(ClassifyError::NotLoaded),
        }
    }

    pub fn catalog(&self) -> Option<&LabelCatalog> {
        self.loaded().ok().map(|l| &l.catalog)
    }

    /// Number of classes, or 0 before a successful load.
    pub fn num_classes(&self) -> usize {
        self.catalog().map_or(0, LabelCatalog::size)
    }

    pub fn all_labels(&self) -> Vec<&str> {
        self.catalog().map(LabelCatalog::all_labels).unwrap_or_default()
    }

    /// Returns information about the engine's current configuration, or
    /// `None` before a successful load.
    pub fn info(&self) -> Option<ClassifierInfo> {
        let loaded = self.loaded().ok()?;
        Some(ClassifierInfo {
            model_path: loaded.model_path.clone(),
            labels_path: loaded.labels_path.clone(),
            backend: loaded.backend.name().to_string(),
            num_classes: loaded.catalog.size(),
            class_labels: loaded.catalog.all_labels().into_iter().map(String::from).collect(),
            input_size: self.input_size,
            color_mode: "RGB".to_string(),
            preprocessing: "identity (0-255, no normalization)".to_string(),
            training: self.training.clone(),
        })
    }

    /// Turns an image into the model input tensor.
    pub fn preprocess(&self, image: &DynamicImage) -> PreprocessedTensor {
        preprocess_with_size(image, self.input_size)
    }

    /// Runs the forward pass and returns the raw score vector of length N.
    ///
    /// # Errors
    /// - `NotLoaded` unless the engine is `Loaded`
    /// - `InferenceFailure` if the backend fails or returns a vector of the
    ///   wrong length or with non-finite values
    pub fn predict_scores(&self, image: &DynamicImage) -> Result<Vec<f32>, ClassifyError> {
        let loaded = self.loaded()?;
        self.scores_for(loaded, image)
    }

    fn scores_for(
        &self,
        loaded: &LoadedModel,
        image: &DynamicImage,
    ) -> Result<Vec<f32>, ClassifyError> {
        let start = Instant::now();
        let tensor = self.preprocess(image);
        let scores = loaded.backend.infer(&tensor)?;
        debug!("Forward pass took {:.2?}", start.elapsed());

        let expected = loaded.catalog.size();
        if scores.len() != expected {
            return Err(ClassifyError::InferenceFailure(format!(
                "model returned {} scores, expected {}",
                scores.len(),
                expected
            )));
        }
        if let Some(pos) = scores.iter().position(|s| !s.is_finite()) {
            return Err(ClassifyError::InferenceFailure(format!(
                "non-finite score {} for class {}",
                scores[pos], pos
            )));
        }
        Ok(scores)
    }

    /// Classifies one image and returns the `top_k` best classes, best first.
    ///
    /// `top_k` larger than the number of classes is clamped. Ties keep the
    /// lower class index first.
    ///
    /// # Errors
    /// - `NotLoaded` unless the engine is `Loaded`
    /// - `InvalidInput` if `top_k` is 0
    /// - `InferenceFailure` if the forward pass fails
    pub fn classify(
        &self,
        image: &DynamicImage,
        top_k: usize,
    ) -> Result<Vec<RankedPrediction>, ClassifyError> {
        let loaded = self.loaded()?;
        if top_k == 0 {
            return Err(ClassifyError::InvalidInput("top_k must be at least 1".into()));
        }

        let scores = self.scores_for(loaded, image)?;
        let k = top_k.min(loaded.catalog.size());

        Ok(top_k_indices(&scores, k)
            .into_iter()
            .map(|idx| RankedPrediction::new(loaded.catalog.get(idx), scores[idx]))
            .collect())
    }

    /// Decodes an encoded image (JPEG, PNG, ...) and classifies it.
    ///
    /// Undecodable bytes fail with `InvalidInput`.
    pub fn classify_bytes(
        &self,
        bytes: &[u8],
        top_k: usize,
    ) -> Result<Vec<RankedPrediction>, ClassifyError> {
        self.loaded()?;
        let image = image::load_from_memory(bytes)
            .map_err(|e| ClassifyError::InvalidInput(format!("cannot decode image: {}", e)))?;
        self.classify(&image, top_k)
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }
}
