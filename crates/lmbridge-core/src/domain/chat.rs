//! Chat message types and the two-role upstream translation.

use serde::{Deserialize, Deserializer, Serialize};

/// Role of a message in an OpenAI-style conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    /// The upstream role this message is forwarded as.
    ///
    /// Upstream providers only know two authors, so system prompts are sent
    /// as user-authored turns.
    #[must_use]
    pub const fn upstream(self) -> UpstreamRole {
        match self {
            Self::System | Self::User => UpstreamRole::User,
            Self::Assistant => UpstreamRole::Assistant,
        }
    }
}

/// A single protocol-neutral chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    /// Text content. A missing or `null` content is read as empty text.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Author of an upstream turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamRole {
    User,
    Assistant,
}

/// A turn in the upstream provider's two-role conversation format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamMessage {
    pub role: UpstreamRole,
    pub text: String,
}

impl UpstreamMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: UpstreamRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: UpstreamRole::Assistant,
            text: text.into(),
        }
    }
}

impl From<&ChatMessage> for UpstreamMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.upstream(),
            text: message.content.clone(),
        }
    }
}

/// Translate a conversation into upstream turns, preserving order exactly.
pub fn translate_messages(messages: &[ChatMessage]) -> Vec<UpstreamMessage> {
    messages.iter().map(UpstreamMessage::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_maps_system_to_user() {
        let messages = vec![
            ChatMessage::new(ChatRole::System, "a"),
            ChatMessage::new(ChatRole::User, "b"),
            ChatMessage::new(ChatRole::Assistant, "c"),
        ];

        let upstream = translate_messages(&messages);

        assert_eq!(
            upstream,
            vec![
                UpstreamMessage::user("a"),
                UpstreamMessage::user("b"),
                UpstreamMessage::assistant("c"),
            ]
        );
    }

    #[test]
    fn test_translate_keeps_order_of_repeated_roles() {
        let messages = vec![
            ChatMessage::new(ChatRole::Assistant, "1"),
            ChatMessage::new(ChatRole::Assistant, "2"),
            ChatMessage::new(ChatRole::User, "3"),
        ];

        let texts: Vec<_> = translate_messages(&messages)
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, ["1", "2", "3"]);
    }

    #[test]
    fn test_null_content_reads_as_empty() {
        let message: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":null}"#).unwrap();
        assert_eq!(message.content, "");

        let message: ChatMessage = serde_json::from_str(r#"{"role":"user"}"#).unwrap();
        assert_eq!(message.content, "");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = serde_json::from_str::<ChatMessage>(r#"{"role":"tool","content":"x"}"#);
        assert!(result.is_err());
    }
}
