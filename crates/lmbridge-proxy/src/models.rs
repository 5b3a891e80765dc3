//! OpenAI API data models for request/response handling.
//!
//! This module contains types that match the OpenAI API wire format.
//! Domain types live in `lmbridge-core`; this module handles the API layer mapping.

use chrono::{DateTime, Utc};
use lmbridge_core::{ChatMessage, ChatRole, ModelDescriptor, TokenUsage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Chat Completion Request/Response Types
// =============================================================================

/// Request to /v1/chat/completions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    /// Requested model; matched as a substring against discovered model ids.
    #[serde(default)]
    pub model: Option<String>,
    /// Full conversation, forwarded verbatim.
    pub messages: Vec<ChatMessage>,
    /// Accepted for compatibility. Responses are always fully buffered.
    #[serde(default)]
    pub stream: Option<bool>,
    /// Accepted for compatibility, not forwarded upstream.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Accepted for compatibility, not forwarded upstream.
    #[serde(default)]
    pub max_tokens: Option<i64>,
}

/// Response from /v1/chat/completions endpoint (non-streaming).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: TokenUsage,
}

impl ChatCompletionResponse {
    /// Build a single-choice completion for `model`.
    pub fn new(model: impl Into<String>, content: String, usage: TokenUsage) -> Self {
        Self::at(Utc::now(), model, content, usage)
    }

    fn at(now: DateTime<Utc>, model: impl Into<String>, content: String, usage: TokenUsage) -> Self {
        Self {
            id: completion_id(now),
            object: "chat.completion".to_string(),
            created: now.timestamp(),
            model: model.into(),
            choices: vec![ChatChoice {
                index: 0,
                message: ResponseMessage {
                    role: ChatRole::Assistant,
                    content,
                },
                finish_reason: "stop".to_string(),
            }],
            usage,
        }
    }
}

/// Time-derived completion id with a random suffix for concurrent requests.
fn completion_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("chatcmpl-{}-{}", now.timestamp_millis(), &suffix[..8])
}

/// A single chat completion choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: String,
}

/// Assistant message within a choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: ChatRole,
    pub content: String,
}

// =============================================================================
// Models / Health Endpoint Types
// =============================================================================

/// Response from /v1/models endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub object: String,
    pub data: Vec<ModelInfo>,
}

impl ModelsResponse {
    /// Create a listing from discovered upstream models.
    pub fn from_descriptors(models: Vec<ModelDescriptor>) -> Self {
        Self {
            object: "list".to_string(),
            data: models.into_iter().map(ModelInfo::from).collect(),
        }
    }
}

/// Information about a single model (OpenAI format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: String,
    pub owned_by: String,
    pub permission: Vec<serde_json::Value>,
}

impl From<ModelDescriptor> for ModelInfo {
    fn from(model: ModelDescriptor) -> Self {
        Self {
            id: model.id,
            object: "model".to_string(),
            owned_by: model.vendor,
            permission: Vec::new(),
        }
    }
}

/// Response from /health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    pub models: Vec<String>,
}

// =============================================================================
// Error Response Types
// =============================================================================

/// Error response matching OpenAI format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail within an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(message: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                r#type: Some(error_type.into()),
                code: None,
            },
        }
    }

    /// Create an error response with a code.
    pub fn with_code(
        message: impl Into<String>,
        error_type: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                r#type: Some(error_type.into()),
                code: Some(code.into()),
            },
        }
    }

    /// Body for unknown routes: `{"error":{"message":"Not found"}}`.
    pub fn not_found() -> Self {
        Self {
            error: ErrorDetail {
                message: "Not found".to_string(),
                r#type: None,
                code: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_completion_shape() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let usage = TokenUsage {
            prompt_tokens: 2,
            completion_tokens: 1,
            total_tokens: 3,
        };
        let response = ChatCompletionResponse::at(now, "gpt-4o", "hi".to_string(), usage);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["object"], "chat.completion");
        assert_eq!(json["created"], now.timestamp());
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["choices"][0]["index"], 0);
        assert_eq!(json["choices"][0]["message"]["role"], "assistant");
        assert_eq!(json["choices"][0]["message"]["content"], "hi");
        assert_eq!(json["choices"][0]["finish_reason"], "stop");
        assert_eq!(json["usage"]["total_tokens"], 3);

        let id = json["id"].as_str().unwrap();
        assert!(id.starts_with(&format!("chatcmpl-{}-", now.timestamp_millis())));
    }

    #[test]
    fn test_completion_ids_are_unique() {
        let now = Utc::now();
        assert_ne!(completion_id(now), completion_id(now));
    }

    #[test]
    fn test_models_listing_shape() {
        let response = ModelsResponse::from_descriptors(vec![ModelDescriptor::new(
            "gpt-4o",
            "copilot",
        )]);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "object": "list",
                "data": [
                    {"id": "gpt-4o", "object": "model", "owned_by": "copilot", "permission": []}
                ]
            })
        );
    }

    #[test]
    fn test_not_found_body_is_exact() {
        let json = serde_json::to_string(&ErrorResponse::not_found()).unwrap();
        assert_eq!(json, r#"{"error":{"message":"Not found"}}"#);
    }

    #[test]
    fn test_request_accepts_optional_fields() {
        let request: ChatCompletionRequest = serde_json::from_str(
            r#"{"model":"gpt","messages":[{"role":"user","content":"x"}],"stream":true,"temperature":0.1,"max_tokens":64,"top_p":1}"#,
        )
        .unwrap();

        assert_eq!(request.model.as_deref(), Some("gpt"));
        assert_eq!(request.stream, Some(true));
        assert_eq!(request.max_tokens, Some(64));
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn test_request_tolerates_null_and_out_of_range_options() {
        let request: ChatCompletionRequest = serde_json::from_str(
            r#"{"messages":[],"stream":null,"temperature":null,"max_tokens":-1}"#,
        )
        .unwrap();

        assert_eq!(request.stream, None);
        assert_eq!(request.temperature, None);
        assert_eq!(request.max_tokens, Some(-1));
    }
}
