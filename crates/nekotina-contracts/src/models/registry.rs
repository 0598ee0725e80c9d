use indexmap::IndexMap;

use crate::chat::Intent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub provider: String,
    pub capabilities: Vec<Intent>,
}

impl ModelSpec {
    pub fn supports(&self, intent: Intent) -> bool {
        self.capabilities.contains(&intent)
    }
}

/// Known models in preference order; the first model for an intent is its
/// default.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn by_capability(&self, intent: Intent) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(intent))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, intent: Intent) -> Option<ModelSpec> {
        let model = self.get(name)?;
        if model.supports(intent) {
            return Some(model.clone());
        }
        None
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str, provider: &str, capabilities: &[Intent]| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                provider: provider.to_string(),
                capabilities: capabilities.to_vec(),
            },
        );
    };

    insert("imagen-4.0-generate-001", "imagen", &[Intent::Generate]);
    insert("imagen-4.0-ultra-generate-001", "imagen", &[Intent::Generate]);
    insert("gemini-2.5-flash-image-preview", "gemini", &[Intent::Edit]);
    insert("gemini-2.5-flash-preview-09-2025", "gemini", &[Intent::Chat]);
    insert("gemini-2.5-flash", "gemini", &[Intent::Chat]);
    insert("gemini-2.5-pro", "gemini", &[Intent::Chat]);

    map
}
