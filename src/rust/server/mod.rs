//! HTTP API over a shared [`ClassifierEngine`].
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use std::sync::Arc;
//! use leafsense::server::{serve, AppState};
//! use leafsense::ClassifierEngine;
//!
//! let engine = ClassifierEngine::open("model.onnx", "class_dict.csv")?;
//! let state = AppState::new(Arc::new(engine));
//! serve(state, "0.0.0.0:8000".parse()?).await?;
//! # Ok(())
//! # }
//! ```

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use log::info;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::classifier::{ClassifierEngine, RankedPrediction};

pub use handlers::{classes, health, predict};

/// Number of predictions returned by `/api/predict`
pub const PREDICT_TOP_K: usize = 5;

/// Default cap on a request body, large enough for full-resolution photos
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: Arc<ClassifierEngine>,
    /// Upper bound on one classification, `None` waits indefinitely
    pub inference_timeout: Option<Duration>,
    /// Largest accepted request body in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(engine: Arc<ClassifierEngine>) -> Self {
        Self {
            engine,
            inference_timeout: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = Some(timeout);
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
}

#[derive(Debug, Serialize)]
pub struct ClassesResponse {
    pub total_classes: usize,
    pub classes: Vec<String>,
}

/// One entry of a `/api/predict` answer
#[derive(Debug, Serialize)]
pub struct PredictionBody {
    pub plant: String,
    pub disease: String,
    /// Percent, two decimals
    pub confidence: f64,
    pub is_healthy: bool,
}

impl From<&RankedPrediction> for PredictionBody {
    fn from(p: &RankedPrediction) -> Self {
        Self {
            plant: p.species.clone(),
            disease: p.condition.clone(),
            confidence: round_percent(p.confidence),
            is_healthy: p.is_healthy,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub predictions: Vec<PredictionBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

fn round_percent(score: f32) -> f64 {
    (f64::from(score) * 10_000.0).round() / 100.0
}

/// Builds the API router.
///
/// Request bodies up to `state.max_upload_bytes` are accepted; axum's own
/// 2 MiB extractor limit is replaced.
pub fn router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);
    Router::new()
        .route("/api/health", get(health))
        .route("/api/classes", get(classes))
        .route("/api/predict", post(predict))
        .layer(body_limit)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `addr` and serves the API until the process ends.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "Serving on http://{} (model loaded: {})",
        listener.local_addr()?,
        state.engine.is_loaded()
    );
    axum::serve(listener, router(state)).await
}
