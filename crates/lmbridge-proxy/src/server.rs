//! Axum HTTP server for the OpenAI-compatible bridge.
//!
//! This module provides the `serve()` function that runs the bridge
//! using a pre-bound TcpListener (from the supervisor), and `router()`
//! for driving the routing table directly in tests.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Request, State},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use lmbridge_core::{
    BridgeLogSink, BridgeSettings, ChatModelProvider, MAX_REQUEST_BODY_BYTES, ModelDescriptor,
    TokenUsage, select_model, translate_messages,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};

use crate::body::read_limited;
use crate::completion::{dispatch, parse_request};
use crate::error::ApiError;
use crate::models::{ChatCompletionResponse, HealthResponse, ModelsResponse};

/// Shared application state for the bridge server.
#[derive(Clone)]
struct BridgeState {
    /// Upstream chat-model capability.
    provider: Arc<dyn ChatModelProvider>,
    /// Read-only settings captured at start.
    settings: Arc<BridgeSettings>,
    /// Event trail sink.
    log: Arc<dyn BridgeLogSink>,
}

/// Build the bridge routing table.
///
/// Unknown paths and unsupported methods on known paths both answer 404.
/// Every `OPTIONS` request is answered with an empty 200, and every
/// response carries permissive CORS headers.
pub fn router(
    settings: BridgeSettings,
    provider: Arc<dyn ChatModelProvider>,
    log: Arc<dyn BridgeLogSink>,
) -> Router {
    let state = BridgeState {
        provider,
        settings: Arc::new(settings),
        log,
    };

    Router::new()
        .route("/health", get(health_check).fallback(not_found))
        .route("/v1/models", get(list_models).fallback(not_found))
        .route(
            "/v1/chat/completions",
            post(chat_completions).fallback(not_found),
        )
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .layer(middleware::from_fn(answer_preflight))
        .layer(DefaultBodyLimit::disable())
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the bridge server with a pre-bound listener.
///
/// Runs until the cancellation token is triggered, then drains in-flight
/// requests.
///
/// # Arguments
///
/// * `listener` - Pre-bound loopback TCP listener (from supervisor)
/// * `settings` - Bridge settings, read once
/// * `provider` - Upstream chat-model provider
/// * `log` - Event trail sink
/// * `cancel` - Cancellation token for graceful shutdown
pub async fn serve(
    listener: TcpListener,
    settings: BridgeSettings,
    provider: Arc<dyn ChatModelProvider>,
    log: Arc<dyn BridgeLogSink>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(provider = provider.name(), "Bridge server starting on {addr}");

    let app = router(settings, provider, log);

    info!("Bridge listening on {addr}");
    info!("Point OpenAI-compatible clients at: http://{addr}/v1");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!("Bridge server shut down");
    Ok(())
}

/// Append `METHOD /path` to the event trail for every request.
async fn record_request(State(state): State<BridgeState>, request: Request, next: Next) -> Response {
    state
        .log
        .record(&format!("{} {}", request.method(), request.uri().path()));
    next.run(request).await
}

/// Answer any `OPTIONS` request with an empty 200.
///
/// Real CORS pre-flights are already answered by the CORS layer; this
/// covers bare `OPTIONS` probes that carry no pre-flight headers.
async fn answer_preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Discover upstream models, treating a discovery fault as "none available".
async fn discover(state: &BridgeState) -> Vec<ModelDescriptor> {
    match state.provider.list_models().await {
        Ok(models) => models,
        Err(e) => {
            warn!("Failed to list upstream models: {e}");
            state.log.record(&format!("Model discovery failed: {e}"));
            Vec::new()
        }
    }
}

/// Health check endpoint with the live model list.
async fn health_check(State(state): State<BridgeState>) -> impl IntoResponse {
    let models = discover(&state).await;
    Json(HealthResponse {
        status: "ok".to_string(),
        provider: state.provider.name().to_string(),
        models: models.into_iter().map(|m| m.id).collect(),
    })
}

/// List upstream models in OpenAI format.
async fn list_models(State(state): State<BridgeState>) -> impl IntoResponse {
    debug!("GET /v1/models");
    Json(ModelsResponse::from_descriptors(discover(&state).await))
}

/// Handle chat completions - pick a model, dispatch upstream, buffer the reply.
async fn chat_completions(State(state): State<BridgeState>, body: Body) -> Response {
    match complete(&state, body).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            error!(status = %e.status(), "Chat completion failed: {e}");
            state.log.record(&format!("Error: {e}"));
            e.into_response()
        }
    }
}

async fn complete(state: &BridgeState, body: Body) -> Result<ChatCompletionResponse, ApiError> {
    let bytes = read_limited(body, MAX_REQUEST_BODY_BYTES).await?;
    let request = parse_request(&bytes)?;

    let models = discover(state).await;
    let model = select_model(
        &models,
        request.model.as_deref(),
        &state.settings.preferred_model,
    )
    .ok_or_else(|| {
        ApiError::ServiceUnavailable(
            "No upstream chat models are available. Sign in to the provider and retry."
                .to_string(),
        )
    })?;

    info!(
        requested = ?request.model,
        model = %model.id,
        messages = request.messages.len(),
        streaming = request.stream.unwrap_or(false),
        "Processing chat completion request"
    );
    state.log.record(&format!("Using model: {}", model.id));

    let text = dispatch(
        state.provider.as_ref(),
        model,
        translate_messages(&request.messages),
        state.settings.request_timeout(),
    )
    .await?;

    state
        .log
        .record(&format!("Response length: {} chars", text.chars().count()));

    let usage = TokenUsage::estimate(&request.messages, &text);
    Ok(ChatCompletionResponse::new(model.id.clone(), text, usage))
}
