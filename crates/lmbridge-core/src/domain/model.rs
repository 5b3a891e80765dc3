//! Upstream model descriptors and the model-selection policy.

use serde::{Deserialize, Serialize};

/// A chat model reported by the upstream provider.
///
/// Descriptors are enumerated fresh on every request and never cached,
/// since availability depends on sign-in state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Model identifier (e.g., "gpt-4o").
    pub id: String,
    /// Vendor or owner of the model (e.g., "copilot", "azure-openai").
    pub vendor: String,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>, vendor: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            vendor: vendor.into(),
        }
    }
}

/// Pick the model to serve a request.
///
/// Resolution order:
/// 1. First model whose id contains the requested model substring
/// 2. First model whose id contains the preferred model substring
/// 3. First discovered model
///
/// Returns `None` only when `models` is empty.
pub fn select_model<'a>(
    models: &'a [ModelDescriptor],
    requested: Option<&str>,
    preferred: &str,
) -> Option<&'a ModelDescriptor> {
    let containing = |needle: &str| models.iter().find(|m| m.id.contains(needle));

    requested
        .and_then(containing)
        .or_else(|| containing(preferred))
        .or_else(|| models.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models() -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::new("A", "copilot"),
            ModelDescriptor::new("B", "copilot"),
            ModelDescriptor::new("C", "copilot"),
        ]
    }

    #[test]
    fn test_requested_model_wins() {
        let models = models();
        let chosen = select_model(&models, Some("B"), "C").unwrap();
        assert_eq!(chosen.id, "B");
    }

    #[test]
    fn test_preferred_model_when_request_does_not_match() {
        let models = models();
        let chosen = select_model(&models, Some("Z"), "C").unwrap();
        assert_eq!(chosen.id, "C");
    }

    #[test]
    fn test_falls_back_to_first_model() {
        let models = models();
        let chosen = select_model(&models, Some("Z"), "Y").unwrap();
        assert_eq!(chosen.id, "A");

        let chosen = select_model(&models, None, "Y").unwrap();
        assert_eq!(chosen.id, "A");
    }

    #[test]
    fn test_substring_match_takes_first_in_discovery_order() {
        let models = vec![
            ModelDescriptor::new("gpt-4o-mini", "copilot"),
            ModelDescriptor::new("gpt-4o", "copilot"),
        ];
        let chosen = select_model(&models, Some("gpt-4o"), "").unwrap();
        assert_eq!(chosen.id, "gpt-4o-mini");
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let models = vec![
            ModelDescriptor::new("claude-sonnet", "copilot"),
            ModelDescriptor::new("GPT-4o", "copilot"),
        ];
        let chosen = select_model(&models, Some("gpt-4o"), "nothing").unwrap();
        assert_eq!(chosen.id, "claude-sonnet");
    }

    #[test]
    fn test_empty_discovery_selects_nothing() {
        assert!(select_model(&[], Some("A"), "A").is_none());
    }
}
