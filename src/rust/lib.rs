//! A thread-safe plant leaf disease classifier running a pretrained CNN
//! through ONNX Runtime (or tract for `.tflite` artifacts).
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use leafsense::{advice, ClassifierBuilder};
//!
//! let engine = ClassifierBuilder::new()
//!     .build_and_load("prediction_model.onnx", "class_dict.csv")?;
//!
//! let image = image::open("leaf.jpg")?;
//! let top = engine.classify(&image, 5)?;
//! for p in &top {
//!     println!("{} / {}: {:.2}%", p.species, p.condition, p.confidence_percent);
//! }
//! println!("{}", advice::for_prediction(&top[0]));
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! A loaded engine is read-only and can be shared across threads using `Arc`:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use leafsense::ClassifierEngine;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let engine = Arc::new(ClassifierEngine::open("prediction_model.onnx", "class_dict.csv")?);
//!
//! let mut handles = vec![];
//! for path in ["a.jpg", "b.jpg", "c.jpg"] {
//!     let engine = Arc::clone(&engine);
//!     handles.push(thread::spawn(move || {
//!         let image = image::open(path).unwrap();
//!         engine.classify(&image, 1).unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod advice;
pub mod artifact;
pub mod classifier;
mod runtime;
pub mod server;

pub use advice::Advice;
pub use classifier::{
    BackendError, BackendKind, ClassifierBuilder, ClassifierEngine, ClassifierInfo, ClassifyError,
    EngineState, LabelCatalog, LabelEntry, LoadError, ModelBackend, PreprocessedTensor,
    RankedPrediction, TrainingInfo,
};
pub use runtime::{create_session_builder, RuntimeConfig};

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
