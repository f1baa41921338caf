use ort::Error as OrtError;
use std::path::PathBuf;

/// Errors raised while bringing a classifier engine to the `Loaded` state.
///
/// Load failures are terminal for the engine instance that produced them: the
/// engine is left in `Failed` and the caller decides whether to retry.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The model artifact could not be read from disk
    #[error("Model artifact unreadable at {path:?}: {message}")]
    ArtifactUnreadable { path: PathBuf, message: String },
    /// The artifact was read but cannot serve as a leaf classifier
    #[error("Model artifact incompatible at {path:?}: {message}")]
    ArtifactIncompatible { path: PathBuf, message: String },
    /// The label table could not be opened or read
    #[error("Label table unreadable at {path:?}: {message}")]
    TableUnreadable { path: PathBuf, message: String },
    /// A row of the label table is missing a column or has a bad index
    #[error("Malformed label table: {0}")]
    MalformedTable(String),
    /// Two rows of the label table claim the same class index
    #[error("Duplicate class index {index} in label table (line {line})")]
    DuplicateIndex { index: usize, line: u64 },
}

/// Per-call classification errors. None of these leave the engine unusable.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Classifier not loaded")]
    NotLoaded,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Inference failure: {0}")]
    InferenceFailure(String),
}

/// Failure reported by a model backend. The engine maps it onto
/// [`LoadError`] or [`ClassifyError::InferenceFailure`] depending on when it
/// happened.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported model: {0}")]
    Unsupported(String),
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<OrtError> for BackendError {
    fn from(err: OrtError) -> Self {
        BackendError::Runtime(err.to_string())
    }
}

impl From<BackendError> for ClassifyError {
    fn from(err: BackendError) -> Self {
        ClassifyError::InferenceFailure(err.to_string())
    }
}

impl LoadError {
    /// Wraps a backend failure that happened while deserializing `path`.
    pub(crate) fn from_backend(path: impl Into<PathBuf>, err: BackendError) -> Self {
        let path = path.into();
        match err {
            BackendError::Io(e) => LoadError::ArtifactUnreadable { path, message: e.to_string() },
            BackendError::Unsupported(message) | BackendError::Runtime(message) => {
                LoadError::ArtifactIncompatible { path, message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_io_maps_to_unreadable() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = LoadError::from_backend("model.onnx", BackendError::Io(io));
        assert!(matches!(err, LoadError::ArtifactUnreadable { .. }));
    }

    #[test]
    fn test_backend_runtime_maps_to_incompatible() {
        let err = LoadError::from_backend("model.onnx", BackendError::Runtime("bad graph".into()));
        assert!(matches!(err, LoadError::ArtifactIncompatible { .. }));
        assert!(err.to_string().contains("bad graph"));
    }

    #[test]
    fn test_backend_error_becomes_inference_failure() {
        let err: ClassifyError = BackendError::Runtime("shape mismatch".into()).into();
        assert!(matches!(err, ClassifyError::InferenceFailure(msg) if msg.contains("shape mismatch")));
    }
}
