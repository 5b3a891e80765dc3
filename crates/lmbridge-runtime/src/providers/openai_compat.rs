//! Provider for OpenAI-compatible upstreams (GitHub Models by default).

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use lmbridge_core::{
    ChatModelProvider, DEFAULT_UPSTREAM_URL, FragmentStream, ModelDescriptor, UpstreamError,
    UpstreamMessage, UpstreamRole,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::sse::{completion_content, content_fragments};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(15);

/// Upstream speaking the OpenAI chat-completions protocol.
///
/// Discovery hits `GET {base}/models` on every call unless a static
/// catalog was configured. Dispatch asks for a stream and accepts a plain
/// JSON completion as a single fragment.
#[derive(Debug, Clone)]
pub struct OpenAiCompatProvider {
    client: Client,
    base_url: String,
    token: Option<String>,
    static_models: Vec<ModelDescriptor>,
}

impl OpenAiCompatProvider {
    /// Create a provider for `base_url` with an optional bearer token.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| UpstreamError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            static_models: Vec::new(),
        })
    }

    /// Provider for the GitHub Models endpoint.
    pub fn github_models(token: Option<String>) -> Result<Self, UpstreamError> {
        Self::new(DEFAULT_UPSTREAM_URL, token)
    }

    /// Serve discovery from a fixed list instead of the upstream catalog.
    #[must_use]
    pub fn with_static_models<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.static_models = ids
            .into_iter()
            .map(|id| ModelDescriptor::new(id, "configured"))
            .collect();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// `GET /models` body: either the OpenAI list object or a bare catalog array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModelCatalog {
    List { data: Vec<CatalogEntry> },
    Bare(Vec<CatalogEntry>),
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    owned_by: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
}

impl ModelCatalog {
    fn into_descriptors(self) -> Vec<ModelDescriptor> {
        match self {
            // OpenAI list entries are addressed by id
            Self::List { data } => data
                .into_iter()
                .filter_map(|e| {
                    let vendor = e.vendor();
                    e.id.or(e.name).map(|id| ModelDescriptor::new(id, vendor))
                })
                .collect(),
            // Catalog entries carry a URI-like id; the short name is what chat accepts
            Self::Bare(entries) => entries
                .into_iter()
                .filter_map(|e| {
                    let vendor = e.vendor();
                    e.name.or(e.id).map(|id| ModelDescriptor::new(id, vendor))
                })
                .collect(),
        }
    }
}

impl CatalogEntry {
    fn vendor(&self) -> String {
        self.owned_by
            .clone()
            .or_else(|| self.publisher.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a UpstreamMessage> for WireMessage<'a> {
    fn from(message: &'a UpstreamMessage) -> Self {
        Self {
            role: match message.role {
                UpstreamRole::User => "user",
                UpstreamRole::Assistant => "assistant",
            },
            content: &message.text,
        }
    }
}

/// Map a non-2xx upstream answer to a provider fault.
///
/// `model` is `None` for discovery, where a 404 means a wrong base URL.
async fn check_status(response: Response, model: Option<&str>) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(%status, ?model, "Upstream rejected request: {body}");

    Err(match (status, model) {
        (StatusCode::NOT_FOUND, Some(model)) => UpstreamError::ModelNotFound(model.to_string()),
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
            UpstreamError::PermissionDenied(format!("upstream answered {status}"))
        }
        _ if body.is_empty() => UpstreamError::Other(format!("Upstream returned {status}")),
        _ => UpstreamError::Other(format!("Upstream returned {status}: {body}")),
    })
}

/// Whether the upstream honoured `stream: true`.
///
/// A missing `Content-Type` is read as an event stream.
fn is_event_stream(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_none_or(|ct| !ct.trim_start().starts_with("application/json"))
}

fn transport(e: &reqwest::Error) -> UpstreamError {
    UpstreamError::Transport(e.to_string())
}

#[async_trait]
impl ChatModelProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, UpstreamError> {
        if !self.static_models.is_empty() {
            return Ok(self.static_models.clone());
        }

        let url = format!("{}/models", self.base_url);
        debug!(%url, "Discovering upstream models");

        let response = self
            .authorized(self.client.get(&url))
            .timeout(DISCOVERY_TIMEOUT)
            .send()
            .await
            .map_err(|e| transport(&e))?;
        let response = check_status(response, None).await?;

        let catalog: ModelCatalog = response
            .json()
            .await
            .map_err(|e| UpstreamError::Protocol(format!("unexpected model catalog: {e}")))?;

        Ok(catalog.into_descriptors())
    }

    async fn send_request(
        &self,
        model: &ModelDescriptor,
        messages: Vec<UpstreamMessage>,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequestBody {
            model: &model.id,
            messages: messages.iter().map(WireMessage::from).collect(),
            stream: true,
        };

        debug!(%url, model = %model.id, turns = messages.len(), "Dispatching upstream chat");

        let request = self.authorized(self.client.post(&url)).json(&body).send();
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(UpstreamError::Cancelled),
            sent = request => sent.map_err(|e| transport(&e))?,
        };
        let response = check_status(response, Some(&model.id)).await?;

        if !is_event_stream(&response) {
            debug!(model = %model.id, "Upstream answered without streaming");
            let body = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(UpstreamError::Cancelled),
                body = response.bytes() => body.map_err(|e| transport(&e))?,
            };
            let text = completion_content(&body)?;
            return Ok(stream::once(async move { Ok(text) }).boxed());
        }

        // Dropping the byte stream closes the upstream connection.
        Ok(content_fragments(response.bytes_stream())
            .take_until(cancel.cancelled_owned())
            .boxed())
    }
}
