//! Axum handlers for the classifier API.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{debug, error, warn};

use super::{
    AppState, ClassesResponse, ErrorBody, HealthResponse, PredictResponse, PredictionBody,
    PREDICT_TOP_K,
};
use crate::classifier::{ClassifierEngine, RankedPrediction};

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

fn not_loaded() -> Response {
    error_response(StatusCode::SERVICE_UNAVAILABLE, "Model not loaded")
}

fn too_large() -> Response {
    error_response(StatusCode::PAYLOAD_TOO_LARGE, "File too large")
}

fn processing_failed() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process image")
}

/// Liveness plus whether a model is ready
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.engine.is_loaded(),
    })
}

/// Every class label in index order
pub async fn classes(State(state): State<AppState>) -> Response {
    match state.engine.catalog() {
        Some(catalog) => Json(ClassesResponse {
            total_classes: catalog.size(),
            classes: catalog.all_labels().into_iter().map(String::from).collect(),
        })
        .into_response(),
        None => not_loaded(),
    }
}

/// Classifies the multipart `file` part and returns the five best classes.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    if !state.engine.is_loaded() {
        return not_loaded();
    }
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            debug!("Rejected predict body: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, "Expected a multipart form upload");
        }
    };

    let bytes = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let is_image = field
                    .content_type()
                    .is_some_and(|ct| ct.starts_with("image/"));
                if !is_image {
                    return error_response(StatusCode::BAD_REQUEST, "File must be an image");
                }
                match field.bytes().await {
                    Ok(bytes) => break bytes,
                    Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                        return too_large();
                    }
                    Err(e) => {
                        warn!("Failed to read upload: {}", e);
                        return processing_failed();
                    }
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => {
                return error_response(StatusCode::BAD_REQUEST, "No file provided");
            }
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return too_large();
            }
            Err(e) => {
                warn!("Malformed multipart body: {}", e);
                return error_response(StatusCode::BAD_REQUEST, "Malformed multipart body");
            }
        }
    };

    match run_classification(&state, bytes.to_vec()).await {
        Ok(ranked) => Json(PredictResponse {
            success: true,
            predictions: ranked.iter().map(PredictionBody::from).collect(),
        })
        .into_response(),
        Err(message) => {
            error!("Prediction failed: {}", message);
            processing_failed()
        }
    }
}

/// Runs the forward pass off the async executor, honouring the timeout.
async fn run_classification(
    state: &AppState,
    bytes: Vec<u8>,
) -> Result<Vec<RankedPrediction>, String> {
    let engine: Arc<ClassifierEngine> = Arc::clone(&state.engine);
    let task = tokio::task::spawn_blocking(move || engine.classify_bytes(&bytes, PREDICT_TOP_K));

    let joined = match state.inference_timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| format!("inference exceeded {:?}", limit))?,
        None => task.await,
    };

    joined
        .map_err(|e| format!("inference task panicked: {}", e))?
        .map_err(|e| e.to_string())
}
