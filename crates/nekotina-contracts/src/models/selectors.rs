use crate::chat::Intent;

use super::registry::{ModelRegistry, ModelSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: ModelSpec,
    pub requested: Option<String>,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    pub registry: ModelRegistry,
}

impl ModelSelector {
    pub fn new(registry: Option<ModelRegistry>) -> Self {
        Self {
            registry: registry.unwrap_or_default(),
        }
    }

    /// Picks the requested model when it serves `intent`, otherwise the
    /// registry default for `intent` along with the reason for falling back.
    /// A `models/` prefix on the requested name is ignored.
    pub fn select(&self, requested: Option<&str>, intent: Intent) -> Result<ModelSelection, String> {
        let requested = requested
            .map(|value| value.trim().trim_start_matches("models/"))
            .filter(|value| !value.is_empty());

        let fallback_reason = match requested {
            Some(name) => {
                if let Some(model) = self.registry.ensure(name, intent) {
                    return Ok(ModelSelection {
                        model,
                        requested: Some(name.to_string()),
                        fallback_reason: None,
                    });
                }
                format!(
                    "Requested model '{name}' unavailable for {} turns.",
                    intent.as_str()
                )
            }
            None => "No model specified; using default.".to_string(),
        };

        let Some(model) = self.registry.by_capability(intent).into_iter().next() else {
            return Err(format!("No models available for {} turns.", intent.as_str()));
        };
        Ok(ModelSelection {
            model,
            requested: requested.map(str::to_string),
            fallback_reason: Some(fallback_reason),
        })
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    #[test]
    fn defaults_cover_every_intent() -> Result<(), String> {
        let selector = ModelSelector::default();
        assert_eq!(
            selector.select(None, Intent::Generate)?.model.name,
            "imagen-4.0-generate-001"
        );
        assert_eq!(
            selector.select(None, Intent::Edit)?.model.name,
            "gemini-2.5-flash-image-preview"
        );
        let chat = selector.select(None, Intent::Chat)?;
        assert_eq!(chat.model.name, "gemini-2.5-flash-preview-09-2025");
        assert_eq!(
            chat.fallback_reason.as_deref(),
            Some("No model specified; using default.")
        );
        Ok(())
    }

    #[test]
    fn requested_model_is_used_when_capable() -> Result<(), String> {
        let selection =
            ModelSelector::default().select(Some("models/gemini-2.5-pro"), Intent::Chat)?;
        assert_eq!(selection.model.name, "gemini-2.5-pro");
        assert_eq!(selection.requested.as_deref(), Some("gemini-2.5-pro"));
        assert!(selection.fallback_reason.is_none());
        Ok(())
    }

    #[test]
    fn incapable_request_falls_back_with_reason() -> Result<(), String> {
        let selection = ModelSelector::default()
            .select(Some("imagen-4.0-generate-001"), Intent::Chat)?;
        assert_eq!(selection.model.name, "gemini-2.5-flash-preview-09-2025");
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some("Requested model 'imagen-4.0-generate-001' unavailable for chat turns.")
        );
        Ok(())
    }

    #[test]
    fn empty_registry_reports_missing_capability() {
        let selector = ModelSelector::new(Some(ModelRegistry::new(Some(IndexMap::new()))));
        let err = selector.select(Some("anything"), Intent::Edit).err().unwrap_or_default();
        assert_eq!(err, "No models available for edit turns.");
    }
}
