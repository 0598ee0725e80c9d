use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use nekotina_contracts::chat::{Intent, DEFAULT_CONTEXT_LIMIT};
use nekotina_contracts::models::ModelSelector;

use crate::captions;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_SYSTEM_PROMPT: &str = "Você é a Nekotina, uma garota brasileira, jovem e zoeira.
SUA PERSONALIDADE:
- Fale como se estivesse no WhatsApp: use \"vc\", \"mn\", \"tlgd\", \"kkkk\", \"eh\".
- Seja debochada mas útil.
- Se receber uma imagem, comente sobre ela de forma engraçada ou analítica (se pedirem).
- Se pedirem para CRIAR imagem, diga \"Peraí que tô desenhando...\" e gere.
- Se pedirem para EDITAR, tente o seu melhor.
- HISTÓRICO: Lembre-se do que conversamos antes. Não tenha amnésia.";

/// Process-level settings, read from the environment and overridden by CLI
/// flags.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub image_model: Option<String>,
    pub edit_model: Option<String>,
    pub chat_model: Option<String>,
    pub context_limit: usize,
    /// `None` waits on the backend indefinitely.
    pub request_timeout: Option<Duration>,
    pub system_prompt_file: Option<PathBuf>,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(non_empty_env)
    }

    /// Same as [`EngineConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let api_base = lookup("GEMINI_API_BASE")
            .map(|value| value.trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_key = lookup("NEKOTINA_API_KEY")
            .or_else(|| lookup("GEMINI_API_KEY"))
            .or_else(|| lookup("GOOGLE_API_KEY"));
        let context_limit = match lookup("NEKOTINA_CONTEXT_LIMIT") {
            Some(raw) => parse_context_limit(&raw)?,
            None => DEFAULT_CONTEXT_LIMIT,
        };
        let request_timeout = match lookup("NEKOTINA_REQUEST_TIMEOUT") {
            Some(raw) => Some(parse_timeout_seconds(&raw)?),
            None => None,
        };
        Ok(Self {
            api_base,
            api_key,
            image_model: lookup("NEKOTINA_IMAGE_MODEL"),
            edit_model: lookup("NEKOTINA_EDIT_MODEL"),
            chat_model: lookup("NEKOTINA_CHAT_MODEL"),
            context_limit,
            request_timeout,
            system_prompt_file: lookup("NEKOTINA_SYSTEM_PROMPT_FILE").map(PathBuf::from),
        })
    }

    /// Persona text: the configured file when set, the built-in prompt
    /// otherwise.
    pub fn system_prompt(&self) -> Result<String> {
        match self.system_prompt_file.as_deref() {
            Some(path) => read_system_prompt(path),
            None => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }

    /// Resolves the three operation models. Unknown or mismatched names fall
    /// back to the registry default and produce a warning.
    pub fn resolve_models(&self, selector: &ModelSelector) -> (OperationModels, Vec<String>) {
        let mut warnings = Vec::new();
        let mut pick = |requested: Option<&str>, intent: Intent, fallback: &str| -> String {
            match selector.select(requested, intent) {
                Ok(selection) => {
                    if let (Some(_), Some(reason)) =
                        (selection.requested.as_ref(), selection.fallback_reason)
                    {
                        warnings.push(reason);
                    }
                    selection.model.name
                }
                Err(message) => {
                    warnings.push(message);
                    fallback.to_string()
                }
            }
        };
        let defaults = OperationModels::default();
        let generate = pick(self.image_model.as_deref(), Intent::Generate, &defaults.generate);
        let edit = pick(self.edit_model.as_deref(), Intent::Edit, &defaults.edit);
        let chat = pick(self.chat_model.as_deref(), Intent::Chat, &defaults.chat);
        (OperationModels { generate, edit, chat }, warnings)
    }

    /// Everything a [`crate::TurnOrchestrator`] needs from the config.
    pub fn orchestrator_settings(&self) -> Result<(OrchestratorSettings, Vec<String>)> {
        let (models, warnings) = self.resolve_models(&ModelSelector::new(None));
        let settings = OrchestratorSettings {
            system_prompt: self.system_prompt()?,
            context_limit: self.context_limit,
            models,
            ..OrchestratorSettings::default()
        };
        Ok((settings, warnings))
    }
}

/// Model name per backend operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationModels {
    pub generate: String,
    pub edit: String,
    pub chat: String,
}

impl OperationModels {
    pub fn for_intent(&self, intent: Intent) -> &str {
        match intent {
            Intent::Generate => &self.generate,
            Intent::Edit => &self.edit,
            Intent::Chat => &self.chat,
        }
    }
}

impl Default for OperationModels {
    fn default() -> Self {
        Self {
            generate: "imagen-4.0-generate-001".to_string(),
            edit: "gemini-2.5-flash-image-preview".to_string(),
            chat: "gemini-2.5-flash-preview-09-2025".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub system_prompt: String,
    pub context_limit: usize,
    pub models: OperationModels,
    pub greeting: String,
    pub reset_greeting: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            context_limit: DEFAULT_CONTEXT_LIMIT,
            models: OperationModels::default(),
            greeting: captions::GREETING.to_string(),
            reset_greeting: captions::RESET_GREETING.to_string(),
        }
    }
}

pub fn parse_context_limit(raw: &str) -> Result<usize> {
    let value: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid context limit '{raw}'"))?;
    Ok(value.max(1))
}

pub fn parse_timeout_seconds(raw: &str) -> Result<Duration> {
    let seconds: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid request timeout '{raw}'"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("request timeout must be a positive number of seconds, got '{raw}'");
    }
    Ok(Duration::from_secs_f64(seconds))
}

fn read_system_prompt(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading system prompt {}", path.display()))?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("system prompt file {} is empty", path.display());
    }
    Ok(trimmed.to_string())
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
