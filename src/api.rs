//! REST API server for vocal analysis
//!
//! Exposes the analyzer over HTTP for upload-style frontends.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::analyzer::VocalAnalyzer;
use crate::input::AudioInput;

/// Header carrying the original file name of an upload
pub const FILE_NAME_HEADER: &str = "x-file-name";

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub analyzer: Arc<VocalAnalyzer>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Analysis Endpoint
/// =============================

async fn analyze_audio(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<ApiResponse>) {
    let media_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let input = match AudioInput::new(body.to_vec(), media_type) {
        Ok(input) => input,
        Err(e) => {
            warn!(media_type = %media_type, bytes = body.len(), "Rejected upload: {}", e);
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(e.to_string())));
        }
    };

    let input = match headers.get(FILE_NAME_HEADER).and_then(|v| v.to_str().ok()) {
        Some(name) => input.with_file_name(name),
        None => input,
    };

    info!(
        media_type = %input.media_type(),
        bytes = input.len(),
        "Received analysis request"
    );

    match state.analyzer.analyze(&input).await {
        Ok(result) => (StatusCode::OK, Json(ApiResponse::success(result))),
        Err(failure) => {
            warn!(kind = %failure.kind(), "Analysis request failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::error(failure.to_string())),
            )
        }
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(analyzer: Arc<VocalAnalyzer>, max_upload_bytes: usize) -> Router {
    let state = ApiState { analyzer };

    Router::new()
        .route("/health", get(health))
        .route("/api/analyze", post(analyze_audio))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    analyzer: Arc<VocalAnalyzer>,
    port: u16,
    max_upload_bytes: usize,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(analyzer, max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
