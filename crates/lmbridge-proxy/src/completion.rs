//! Chat-completion pipeline: parse, dispatch and accumulate.
//!
//! Each dispatch runs in its own cancellation scope. The scope's token is
//! handed to the provider and is cancelled when
//! - the configured timeout elapses, or
//! - the request future is dropped (the HTTP client disconnected).
//!
//! Both the upstream send and every fragment boundary race against the
//! deadline, so a timeout mid-stream stops consumption promptly.

use std::time::Duration;

use futures_util::StreamExt;
use lmbridge_core::{
    ChatModelProvider, FragmentStream, ModelDescriptor, UpstreamError, UpstreamMessage,
};
use tokio::time::{Instant, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ApiError;
use crate::models::ChatCompletionRequest;

/// Parse a chat-completion body.
///
/// The `messages` field is checked for presence and shape before the typed
/// decode so that a missing conversation gets a precise error.
pub fn parse_request(body: &[u8]) -> Result<ChatCompletionRequest, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))?;

    if !value.get("messages").is_some_and(serde_json::Value::is_array) {
        return Err(ApiError::BadRequest(
            "Request must include a 'messages' array".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid chat completion request: {e}")))
}

/// Send `messages` to `model` and collect the full response text.
///
/// Single-shot: no retries and no fallback to another model.
pub async fn dispatch(
    provider: &dyn ChatModelProvider,
    model: &ModelDescriptor,
    messages: Vec<UpstreamMessage>,
    timeout: Duration,
) -> Result<String, UpstreamError> {
    let cancel = CancellationToken::new();
    let disconnect_guard = cancel.clone().drop_guard();

    let result = dispatch_scoped(provider, model, messages, timeout, &cancel).await;

    // Completed without being dropped; nothing left to cancel.
    let _ = disconnect_guard.disarm();
    result
}

async fn dispatch_scoped(
    provider: &dyn ChatModelProvider,
    model: &ModelDescriptor,
    messages: Vec<UpstreamMessage>,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<String, UpstreamError> {
    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    let deadline = tokio::time::sleep_until(Instant::now() + timeout);
    tokio::pin!(deadline);

    debug!(model = %model.id, turns = messages.len(), "Sending upstream request");

    let fragments = tokio::select! {
        biased;
        () = &mut deadline => {
            cancel.cancel();
            return Err(UpstreamError::TimedOut(timeout_ms));
        }
        sent = provider.send_request(model, messages, cancel.clone()) => sent?,
    };

    accumulate(fragments, cancel, deadline, timeout_ms).await
}

/// Concatenate fragments in arrival order until the stream ends.
async fn accumulate(
    mut fragments: FragmentStream,
    cancel: &CancellationToken,
    mut deadline: std::pin::Pin<&mut Sleep>,
    timeout_ms: u64,
) -> Result<String, UpstreamError> {
    let mut text = String::new();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(UpstreamError::Cancelled),
            () = &mut deadline => {
                cancel.cancel();
                return Err(UpstreamError::TimedOut(timeout_ms));
            }
            next = fragments.next() => match next {
                Some(Ok(fragment)) => text.push_str(&fragment),
                Some(Err(err)) => return Err(err),
                None => return Ok(text),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures_util::stream;
    use std::sync::Mutex;

    /// Provider whose fragments and send behaviour are scripted per test.
    #[derive(Debug)]
    struct ScriptedProvider {
        fragments: Vec<Result<String, String>>,
        /// Never finish the fragment stream after the scripted items.
        hang: bool,
        seen_token: Mutex<Option<CancellationToken>>,
    }

    impl ScriptedProvider {
        fn new(fragments: &[&str]) -> Self {
            Self {
                fragments: fragments.iter().map(|f| Ok((*f).to_string())).collect(),
                hang: false,
                seen_token: Mutex::new(None),
            }
        }

        fn hanging(fragments: &[&str]) -> Self {
            Self {
                hang: true,
                ..Self::new(fragments)
            }
        }

        fn token(&self) -> CancellationToken {
            self.seen_token.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl ChatModelProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn list_models(&self) -> Result<Vec<ModelDescriptor>, UpstreamError> {
            Ok(vec![ModelDescriptor::new("m", "test")])
        }

        async fn send_request(
            &self,
            _model: &ModelDescriptor,
            _messages: Vec<UpstreamMessage>,
            cancel: CancellationToken,
        ) -> Result<FragmentStream, UpstreamError> {
            *self.seen_token.lock().unwrap() = Some(cancel);
            let items: Vec<_> = self
                .fragments
                .iter()
                .cloned()
                .map(|f| f.map_err(UpstreamError::Other))
                .collect();
            let scripted = stream::iter(items);
            if self.hang {
                Ok(scripted.chain(stream::pending()).boxed())
            } else {
                Ok(scripted.boxed())
            }
        }
    }

    fn model() -> ModelDescriptor {
        ModelDescriptor::new("m", "test")
    }

    #[tokio::test]
    async fn test_fragments_are_concatenated_in_order() {
        let provider = ScriptedProvider::new(&["Hel", "lo", ", ", "world"]);
        let text = dispatch(&provider, &model(), vec![], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(text, "Hello, world");
        assert!(!provider.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_empty_stream_yields_empty_text() {
        let provider = ScriptedProvider::new(&[]);
        let text = dispatch(&provider, &model(), vec![], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_fragment_error_aborts_without_partial_text() {
        let provider = ScriptedProvider {
            fragments: vec![Ok("partial".into()), Err("stream reset".into())],
            hang: false,
            seen_token: Mutex::new(None),
        };
        let err = dispatch(&provider, &model(), vec![], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Other(msg) if msg == "stream reset"));
    }

    #[tokio::test]
    async fn test_timeout_mid_stream_cancels_upstream() {
        let provider = ScriptedProvider::hanging(&["partial"]);
        let err = dispatch(&provider, &model(), vec![], Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::TimedOut(50)));
        assert!(provider.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_request_cancels_upstream() {
        let provider = ScriptedProvider::hanging(&[]);
        let model = model();
        let pending = dispatch(&provider, &model, vec![], Duration::from_secs(60));

        // Simulates the client going away: the request future is dropped.
        let outcome = tokio::time::timeout(Duration::from_millis(20), pending).await;
        assert!(outcome.is_err());
        assert!(provider.token().is_cancelled());
    }

    #[test]
    fn test_parse_rejects_missing_messages() {
        let err = parse_request(br#"{"model":"gpt-4o"}"#).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("messages")));
    }

    #[test]
    fn test_parse_rejects_non_array_messages() {
        let err = parse_request(br#"{"messages":"hello"}"#).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("messages")));
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = parse_request(b"{not json").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.starts_with("Invalid JSON")));
    }

    #[test]
    fn test_parse_accepts_empty_conversation() {
        let request = parse_request(br#"{"messages":[]}"#).unwrap();
        assert!(request.messages.is_empty());
        assert!(request.model.is_none());
    }
}
