use nekotina_contracts::chat::Intent;
use nekotina_contracts::conversation::Attachment;
use nekotina_contracts::wire::gemini::{Content, GenerateContentRequest, GenerationConfig, Part};
use nekotina_contracts::wire::imagen::{PredictInstance, PredictParameters, PredictRequest};
use serde_json::Value;

/// Text-to-image body: the trimmed turn text as the sole prompt, one sample.
pub fn build_generate_request(text: &str) -> PredictRequest {
    PredictRequest {
        instances: vec![PredictInstance {
            prompt: text.trim().to_string(),
        }],
        parameters: PredictParameters { sample_count: 1 },
    }
}

/// Image edit body. Carries no history and no system instruction; the
/// backend is asked for an image back.
pub fn build_edit_request(text: &str, attachment: &Attachment) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::new(
            None,
            vec![Part::text(text.trim()), attachment.inline_part()],
        )],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            response_modalities: vec!["IMAGE".to_string()],
        }),
    }
}

/// Chat body: the context window produced by `build_chat_context` plus the
/// persona instruction.
pub fn build_chat_request(contents: Vec<Content>, system_prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents,
        system_instruction: Some(Content::new(None, vec![Part::text(system_prompt)])),
        generation_config: None,
    }
}

/// A request bound to the model that will serve it.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendRequest {
    Generate { model: String, body: PredictRequest },
    Edit { model: String, body: GenerateContentRequest },
    Chat { model: String, body: GenerateContentRequest },
}

impl BackendRequest {
    pub fn intent(&self) -> Intent {
        match self {
            BackendRequest::Generate { .. } => Intent::Generate,
            BackendRequest::Edit { .. } => Intent::Edit,
            BackendRequest::Chat { .. } => Intent::Chat,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            BackendRequest::Generate { model, .. }
            | BackendRequest::Edit { model, .. }
            | BackendRequest::Chat { model, .. } => model,
        }
    }

    /// Path below the API base, e.g. `models/gemini-2.5-flash:generateContent`.
    pub fn endpoint_path(&self) -> String {
        let trimmed = self.model().trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        let method = match self {
            BackendRequest::Generate { .. } => "predict",
            BackendRequest::Edit { .. } | BackendRequest::Chat { .. } => "generateContent",
        };
        format!("{model_path}:{method}")
    }

    pub fn body_json(&self) -> serde_json::Result<Value> {
        match self {
            BackendRequest::Generate { body, .. } => serde_json::to_value(body),
            BackendRequest::Edit { body, .. } | BackendRequest::Chat { body, .. } => {
                serde_json::to_value(body)
            }
        }
    }

    /// Number of `contents` entries sent, zero for text-to-image.
    pub fn context_len(&self) -> usize {
        match self {
            BackendRequest::Generate { .. } => 0,
            BackendRequest::Edit { body, .. } | BackendRequest::Chat { body, .. } => {
                body.contents.len()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use nekotina_contracts::chat::{build_chat_context, CurrentAttachment};
    use nekotina_contracts::conversation::Turn;
    use serde_json::json;

    use super::*;

    #[test]
    fn generate_body_holds_only_the_prompt() -> anyhow::Result<()> {
        let request = BackendRequest::Generate {
            model: "imagen-4.0-generate-001".to_string(),
            body: build_generate_request("  desenha um gato astronauta "),
        };
        assert_eq!(
            request.body_json()?,
            json!({
                "instances": [{"prompt": "desenha um gato astronauta"}],
                "parameters": {"sampleCount": 1}
            })
        );
        assert_eq!(request.endpoint_path(), "models/imagen-4.0-generate-001:predict");
        assert_eq!(request.intent(), Intent::Generate);
        assert_eq!(request.context_len(), 0);
        Ok(())
    }

    #[test]
    fn edit_body_is_single_entry_asking_for_an_image() -> anyhow::Result<()> {
        let attachment = Attachment::new("image/png", vec![1, 2, 3]);
        let request = BackendRequest::Edit {
            model: "models/gemini-2.5-flash-image-preview".to_string(),
            body: build_edit_request("troca o fundo", &attachment),
        };
        assert_eq!(
            request.body_json()?,
            json!({
                "contents": [{
                    "parts": [
                        {"text": "troca o fundo"},
                        {"inlineData": {"mimeType": "image/png", "data": "AQID"}}
                    ]
                }],
                "generationConfig": {"responseModalities": ["IMAGE"]}
            })
        );
        assert_eq!(
            request.endpoint_path(),
            "models/gemini-2.5-flash-image-preview:generateContent"
        );
        Ok(())
    }

    #[test]
    fn chat_body_carries_window_and_persona() -> anyhow::Result<()> {
        let attachment = Attachment::new("image/jpeg", vec![7]);
        let history = vec![
            Turn::assistant(Some("oi".to_string()), None).expect("greeting"),
            Turn::user("o que é isso", Some(attachment.preview().clone())).expect("user turn"),
        ];
        let contents = build_chat_context(
            &history,
            10,
            Some(CurrentAttachment {
                text: "o que é isso",
                attachment: &attachment,
            }),
        );
        let body = build_chat_request(contents, "seja zoeira");
        let value = serde_json::to_value(&body)?;
        assert_eq!(value["systemInstruction"], json!({"parts": [{"text": "seja zoeira"}]}));
        assert_eq!(value["contents"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["contents"][1]["parts"][1]["inlineData"]["data"], "Bw==");
        assert!(value.get("generationConfig").is_none());
        Ok(())
    }
}
