//! Offline provider with a fixed catalog and a canned reply.

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use lmbridge_core::{
    ChatModelProvider, FragmentStream, ModelDescriptor, UpstreamError, UpstreamMessage,
    UpstreamRole,
};
use tokio_util::sync::CancellationToken;

const OFFLINE_MODELS: [&str; 2] = ["gpt-4o", "gpt-4o-mini"];

/// Provider that never leaves the process.
///
/// The reply is split into word-sized fragments so clients see the same
/// accumulation path as with a real upstream.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    models: Vec<ModelDescriptor>,
    reply: Option<String>,
}

impl StaticProvider {
    /// Fixed catalog answering every request with `reply`.
    pub fn new(models: Vec<ModelDescriptor>, reply: impl Into<String>) -> Self {
        Self {
            models,
            reply: Some(reply.into()),
        }
    }

    /// Catalog used by `--offline`; replies echo the last user turn.
    pub fn offline() -> Self {
        Self {
            models: OFFLINE_MODELS
                .iter()
                .map(|id| ModelDescriptor::new(*id, "offline"))
                .collect(),
            reply: None,
        }
    }

    fn reply_for(&self, model: &ModelDescriptor, messages: &[UpstreamMessage]) -> String {
        if let Some(reply) = &self.reply {
            return reply.clone();
        }
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == UpstreamRole::User)
            .map_or("", |m| m.text.as_str());
        format!("[{}] {last_user}", model.id)
    }
}

#[async_trait]
impl ChatModelProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, UpstreamError> {
        Ok(self.models.clone())
    }

    async fn send_request(
        &self,
        model: &ModelDescriptor,
        messages: Vec<UpstreamMessage>,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, UpstreamError> {
        if !self.models.iter().any(|m| m.id == model.id) {
            return Err(UpstreamError::ModelNotFound(model.id.clone()));
        }

        let fragments: Vec<Result<String, UpstreamError>> = self
            .reply_for(model, &messages)
            .split_inclusive(' ')
            .map(|word| Ok(word.to_string()))
            .collect();

        Ok(stream::iter(fragments)
            .take_until(cancel.cancelled_owned())
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;

    #[tokio::test]
    async fn test_canned_reply_reassembles() {
        let provider = StaticProvider::new(vec![ModelDescriptor::new("m", "v")], "one two three");
        let model = provider.list_models().await.unwrap().remove(0);

        let fragments: Vec<String> = provider
            .send_request(&model, vec![], CancellationToken::new())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(fragments, vec!["one ", "two ", "three"]);
    }

    #[tokio::test]
    async fn test_offline_echoes_last_user_turn() {
        let provider = StaticProvider::offline();
        let model = ModelDescriptor::new("gpt-4o", "offline");
        let messages = vec![
            UpstreamMessage::user("first"),
            UpstreamMessage::assistant("ok"),
            UpstreamMessage::user("second"),
        ];

        let text: String = provider
            .send_request(&model, messages, CancellationToken::new())
            .await
            .unwrap()
            .try_collect::<Vec<_>>()
            .await
            .unwrap()
            .concat();

        assert_eq!(text, "[gpt-4o] second");
    }

    #[tokio::test]
    async fn test_unknown_model_is_not_found() {
        let provider = StaticProvider::offline();
        let err = provider
            .send_request(
                &ModelDescriptor::new("nope", "x"),
                vec![],
                CancellationToken::new(),
            )
            .await
            .err()
            .unwrap();
        assert!(matches!(err, UpstreamError::ModelNotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_cancelled_token_ends_stream() {
        let provider = StaticProvider::new(vec![ModelDescriptor::new("m", "v")], "a b c");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let fragments: Vec<String> = provider
            .send_request(&ModelDescriptor::new("m", "v"), vec![], cancel)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert!(fragments.is_empty());
    }
}
