use std::sync::Arc;
use std::time::Duration;

use audiograb_core::{
    ConcurrencyGate, FallbackChain, FetchConfig, FetchRequest, FetchSuccess, VideoId,
};
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::error::ApiError;

/// Shared per-process state: the gate and the chain outlive any request.
#[derive(Clone)]
pub struct AppState {
    pub gate: ConcurrencyGate,
    pub chain: Arc<FallbackChain>,
    pub config: Arc<FetchConfig>,
}

impl AppState {
    pub fn new(config: FetchConfig) -> Self {
        let chain = FallbackChain::standard(&config);
        Self::with_chain(config, chain)
    }

    /// State with a caller-supplied chain; tests inject scripted sources here.
    pub fn with_chain(config: FetchConfig, chain: FallbackChain) -> Self {
        Self {
            gate: ConcurrencyGate::new(config.max_concurrent),
            chain: Arc::new(chain),
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/transcode", get(transcode))
        .route("/api/status", get(status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct TranscodeParams {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

async fn transcode(
    State(state): State<AppState>,
    Query(params): Query<TranscodeParams>,
) -> Result<Response, ApiError> {
    // Validation happens before admission: a bad request never consumes gate
    // capacity.
    let raw = params.video_id.unwrap_or_default();
    if raw.trim().is_empty() {
        return Err(ApiError::MissingVideoId);
    }
    let video_id = VideoId::parse(&raw).map_err(ApiError::InvalidVideoId)?;

    let request = FetchRequest::new(video_id);
    log::info!(
        "[{}] transcode request for video '{}'",
        request.request_id,
        request.video_id
    );

    let Some(_permit) = state.gate.try_admit() else {
        log::warn!(
            "[{}] at capacity: {}/{}",
            request.request_id,
            state.gate.in_flight(),
            state.gate.max_concurrent()
        );
        return Err(ApiError::AtCapacity {
            retry_after: state.config.retry_after,
        });
    };

    // The permit is dropped when this function returns, on every path,
    // including the handler future being dropped on client disconnect.
    match state.chain.run(&request).await {
        Ok(success) => {
            log::info!(
                "[{}] served {} bytes from '{}' in {}ms",
                request.request_id,
                success.payload.len(),
                success.selected_source,
                success.latency_ms
            );
            Ok(audio_response(&request, success, state.config.cache_max_age))
        }
        Err(failure) => {
            log::error!("[{}] {}", request.request_id, failure.consolidated_message());
            Err(ApiError::AllSourcesFailed(failure))
        }
    }
}

fn audio_response(
    request: &FetchRequest,
    success: FetchSuccess,
    cache_max_age: Duration,
) -> Response {
    let payload = success.payload;
    let filename = format!("{}.{}", request.video_id, payload.preferred_extension());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, payload.media_type.as_str())
        .header(header::CONTENT_LENGTH, payload.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .header(
            header::CACHE_CONTROL,
            format!("public, max-age={}", cache_max_age.as_secs()),
        )
        .body(Body::from(payload.bytes))
        .expect("validated id and media type are legal header values")
}

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "in_flight": state.gate.in_flight(),
        "max_concurrent": state.gate.max_concurrent(),
    }))
}
