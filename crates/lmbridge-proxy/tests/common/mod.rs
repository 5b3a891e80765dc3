//! Shared fixtures for bridge route tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::{StreamExt, stream};
use http_body_util::BodyExt;
use lmbridge_core::{
    BridgeLogSink, BridgeSettings, ChatModelProvider, FragmentStream, ModelDescriptor,
    UpstreamError, UpstreamMessage,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

/// How the mock provider answers a send.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Yield these fragments then finish.
    Fragments(Vec<String>),
    /// Fail the send with a model-not-found fault.
    ModelNotFound,
    /// Fail the send with a permission fault.
    PermissionDenied,
    /// Fail the send with a generic fault.
    Fault(String),
    /// Never produce a fragment.
    Hang,
}

/// Scripted provider that records what the bridge sent it.
#[derive(Debug)]
pub struct MockProvider {
    models: Option<Vec<ModelDescriptor>>,
    reply: Reply,
    pub sent: Mutex<Vec<(String, Vec<UpstreamMessage>)>>,
}

impl MockProvider {
    pub fn with_models(ids: &[&str], reply: Reply) -> Self {
        Self {
            models: Some(ids.iter().map(|id| ModelDescriptor::new(*id, "mock")).collect()),
            reply,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Provider whose discovery always fails.
    pub fn unreachable() -> Self {
        Self {
            models: None,
            reply: Reply::Hang,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent_models(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(model, _)| model.clone())
            .collect()
    }
}

#[async_trait]
impl ChatModelProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, UpstreamError> {
        self.models
            .clone()
            .ok_or_else(|| UpstreamError::Transport("connection refused".into()))
    }

    async fn send_request(
        &self,
        model: &ModelDescriptor,
        messages: Vec<UpstreamMessage>,
        _cancel: CancellationToken,
    ) -> Result<FragmentStream, UpstreamError> {
        self.sent
            .lock()
            .unwrap()
            .push((model.id.clone(), messages));

        match &self.reply {
            Reply::Fragments(parts) => {
                Ok(stream::iter(parts.clone().into_iter().map(Ok)).boxed())
            }
            Reply::ModelNotFound => Err(UpstreamError::ModelNotFound(model.id.clone())),
            Reply::PermissionDenied => {
                Err(UpstreamError::PermissionDenied("user has not consented".into()))
            }
            Reply::Fault(msg) => Err(UpstreamError::Other(msg.clone())),
            Reply::Hang => Ok(stream::pending().boxed()),
        }
    }
}

/// Sink that keeps every line for assertions.
#[derive(Debug, Default)]
pub struct CapturingSink {
    pub lines: Mutex<Vec<String>>,
}

impl BridgeLogSink for CapturingSink {
    fn append(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }
}

impl CapturingSink {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }
}

pub fn app(provider: Arc<MockProvider>) -> Router {
    app_with(provider, BridgeSettings::default(), Arc::new(CapturingSink::default()))
}

pub fn app_with(
    provider: Arc<MockProvider>,
    settings: BridgeSettings,
    sink: Arc<CapturingSink>,
) -> Router {
    lmbridge_proxy::router(settings, provider, sink)
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("body is JSON")
}

pub fn chat_request(body: impl Into<Body>) -> Request<Body> {
    Request::post("/v1/chat/completions")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}
