use nekotina_contracts::chat::Intent;
use nekotina_contracts::conversation::ImageRef;
use nekotina_contracts::wire::gemini::GenerateContentResponse;
use nekotina_contracts::wire::imagen::PredictResponse;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backend::BackendTransportError;
use crate::captions;

const DEFAULT_IMAGE_MIME: &str = "image/png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The backend produced the content that was asked for.
    Delivered,
    /// The call succeeded but the expected content was missing; the reply
    /// carries a fallback caption.
    ContentAbsent,
    /// No usable body.
    TransportFailed,
}

impl ReplyOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplyOutcome::Delivered => "delivered",
            ReplyOutcome::ContentAbsent => "content_absent",
            ReplyOutcome::TransportFailed => "transport_failed",
        }
    }
}

/// What the assistant turn for a backend response should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: Option<String>,
    pub image: Option<ImageRef>,
    pub failed: bool,
    pub outcome: ReplyOutcome,
    /// Why the reply failed, for logs only.
    pub detail: Option<String>,
}

impl Reply {
    fn delivered(text: impl Into<String>, image: Option<ImageRef>) -> Self {
        Self {
            text: Some(text.into()),
            image,
            failed: false,
            outcome: ReplyOutcome::Delivered,
            detail: None,
        }
    }

    fn content_absent(caption: &str) -> Self {
        Self {
            text: Some(caption.to_string()),
            image: None,
            failed: false,
            outcome: ReplyOutcome::ContentAbsent,
            detail: None,
        }
    }

    fn transport_failed(detail: impl Into<String>) -> Self {
        Self {
            text: Some(captions::CONNECTION_ERROR.to_string()),
            image: None,
            failed: true,
            outcome: ReplyOutcome::TransportFailed,
            detail: Some(detail.into()),
        }
    }
}

/// Maps a backend result onto a reply. Never panics and never errors: every
/// failure mode becomes a failed reply with the connection caption.
pub fn normalize(intent: Intent, result: Result<Value, BackendTransportError>) -> Reply {
    let body = match result {
        Ok(body) => body,
        Err(err) => return Reply::transport_failed(err.to_string()),
    };
    let outcome = match intent {
        Intent::Generate => parse_body(body).and_then(|response| normalize_generate(&response)),
        Intent::Edit => parse_body(body).and_then(|response| normalize_edit(&response)),
        Intent::Chat => parse_body(body).map(|response| normalize_chat(&response)),
    };
    outcome.unwrap_or_else(|detail| Reply::transport_failed(detail))
}

fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, String> {
    if !body.is_object() {
        return Err(format!("expected a JSON object, got {body}"));
    }
    serde_json::from_value(body).map_err(|err| format!("unexpected response shape: {err}"))
}

/// First prediction's image, or the generation-failed caption.
pub fn normalize_generate(response: &PredictResponse) -> Result<Reply, String> {
    let Some(encoded) = response.first_image() else {
        return Ok(Reply::content_absent(captions::GENERATE_EMPTY));
    };
    let mime = encoded
        .mime_type
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(DEFAULT_IMAGE_MIME);
    let image = decode_image(mime, encoded.data)?;
    Ok(Reply::delivered(captions::GENERATE_SUCCESS, Some(image)))
}

/// Inline image when present, else the model's own text, else a caption
/// admitting the edit did not happen.
pub fn normalize_edit(response: &GenerateContentResponse) -> Result<Reply, String> {
    if let Some(inline) = response.first_inline_data() {
        let mime = if inline.mime_type.trim().is_empty() {
            DEFAULT_IMAGE_MIME
        } else {
            inline.mime_type.as_str()
        };
        let image = decode_image(mime, &inline.data)?;
        return Ok(Reply::delivered(captions::EDIT_SUCCESS, Some(image)));
    }
    if let Some(text) = response.first_text() {
        return Ok(Reply::delivered(text, None));
    }
    Ok(Reply::content_absent(captions::EDIT_FALLBACK))
}

pub fn normalize_chat(response: &GenerateContentResponse) -> Reply {
    match response.first_text() {
        Some(text) => Reply::delivered(text, None),
        None => Reply::content_absent(captions::CHAT_FALLBACK),
    }
}

fn decode_image(mime: &str, data: &str) -> Result<ImageRef, String> {
    let image = ImageRef::from_base64(mime.trim(), data)
        .map_err(|err| format!("image payload is not valid base64: {err}"))?;
    if image.is_empty() {
        return Err("image payload decoded to zero bytes".to_string());
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::backend::TransportErrorKind;

    #[test]
    fn generate_reads_first_prediction() {
        let reply = normalize(
            Intent::Generate,
            Ok(json!({"predictions": [
                {"bytesBase64Encoded": "AQID", "mimeType": "image/jpeg"},
                {"bytesBase64Encoded": "BAUG"}
            ]})),
        );
        assert_eq!(reply.outcome, ReplyOutcome::Delivered);
        assert_eq!(reply.text.as_deref(), Some(captions::GENERATE_SUCCESS));
        let image = reply.image.expect("image decoded");
        assert_eq!(image.media_type(), "image/jpeg");
        assert_eq!(image.bytes(), &[1, 2, 3]);
        assert!(!reply.failed);
    }

    #[test]
    fn generate_defaults_media_type_to_png() {
        let reply = normalize(
            Intent::Generate,
            Ok(json!({"predictions": [{"bytesBase64Encoded": "AQID"}]})),
        );
        let image = reply.image.expect("image decoded");
        assert_eq!(image.media_type(), "image/png");
    }

    #[test]
    fn generate_without_image_uses_caption() {
        for body in [json!({}), json!({"predictions": []}), json!({"predictions": null})] {
            let reply = normalize(Intent::Generate, Ok(body));
            assert_eq!(reply.outcome, ReplyOutcome::ContentAbsent);
            assert_eq!(reply.text.as_deref(), Some(captions::GENERATE_EMPTY));
            assert!(reply.image.is_none());
            assert!(!reply.failed);
        }
    }

    #[test]
    fn edit_prefers_image_then_text_then_caption() {
        let with_image = normalize(
            Intent::Edit,
            Ok(json!({"candidates": [{"content": {"parts": [
                {"text": "aqui"},
                {"inlineData": {"mimeType": "image/webp", "data": "AQID"}}
            ]}}]})),
        );
        assert_eq!(with_image.text.as_deref(), Some(captions::EDIT_SUCCESS));
        assert_eq!(
            with_image.image.as_ref().map(ImageRef::media_type),
            Some("image/webp")
        );

        let text_only = normalize(
            Intent::Edit,
            Ok(json!({"candidates": [{"content": {"parts": [{"text": "ficaria azul"}]}}]})),
        );
        assert_eq!(text_only.outcome, ReplyOutcome::Delivered);
        assert_eq!(text_only.text.as_deref(), Some("ficaria azul"));
        assert!(text_only.image.is_none());

        let empty = normalize(Intent::Edit, Ok(json!({"candidates": []})));
        assert_eq!(empty.outcome, ReplyOutcome::ContentAbsent);
        assert_eq!(empty.text.as_deref(), Some(captions::EDIT_FALLBACK));
    }

    #[test]
    fn chat_takes_first_text_or_falls_back() {
        let reply = normalize(
            Intent::Chat,
            Ok(json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "kkkk eh um gato"}]}}]})),
        );
        assert_eq!(reply.text.as_deref(), Some("kkkk eh um gato"));
        assert_eq!(reply.outcome, ReplyOutcome::Delivered);

        for body in [
            json!({}),
            json!({"candidates": null}),
            json!({"candidates": [{"finishReason": "SAFETY"}]}),
            json!({"candidates": [{"content": {"parts": []}}]}),
        ] {
            let reply = normalize(Intent::Chat, Ok(body));
            assert_eq!(reply.text.as_deref(), Some(captions::CHAT_FALLBACK));
            assert_eq!(reply.outcome, ReplyOutcome::ContentAbsent);
            assert!(!reply.failed);
        }
    }

    #[test]
    fn null_optional_fields_read_as_absent() {
        let edit = normalize(
            Intent::Edit,
            Ok(json!({"candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": null, "data": "AQID"}}
            ]}}]})),
        );
        assert!(!edit.failed);
        assert_eq!(edit.outcome, ReplyOutcome::Delivered);
        assert_eq!(edit.image.as_ref().map(ImageRef::media_type), Some("image/png"));

        let cases = [
            (Intent::Chat, json!({"candidates": [null]}), captions::CHAT_FALLBACK),
            (
                Intent::Chat,
                json!({"candidates": [{"content": {"parts": [null]}}]}),
                captions::CHAT_FALLBACK,
            ),
            (
                Intent::Chat,
                json!({"candidates": [{"content": null, "finishReason": null}]}),
                captions::CHAT_FALLBACK,
            ),
            (Intent::Generate, json!({"predictions": [null]}), captions::GENERATE_EMPTY),
            (
                Intent::Edit,
                json!({"candidates": [{"content": {"parts": [
                    {"text": null, "inlineData": {"mimeType": "image/png", "data": null}}
                ]}}]}),
                captions::EDIT_FALLBACK,
            ),
        ];
        for (intent, body, caption) in cases {
            let reply = normalize(intent, Ok(body.clone()));
            assert!(!reply.failed, "{intent:?} {body}");
            assert_eq!(reply.outcome, ReplyOutcome::ContentAbsent, "{body}");
            assert_eq!(reply.text.as_deref(), Some(caption));
        }
    }

    #[test]
    fn transport_errors_become_failed_replies() {
        let reply = normalize(
            Intent::Chat,
            Err(BackendTransportError::new(TransportErrorKind::Status(500), "boom")),
        );
        assert!(reply.failed);
        assert_eq!(reply.outcome, ReplyOutcome::TransportFailed);
        assert_eq!(reply.text.as_deref(), Some(captions::CONNECTION_ERROR));
        assert!(reply.detail.as_deref().unwrap_or_default().contains("500"));
    }

    #[test]
    fn malformed_bodies_become_failed_replies() {
        let cases = [
            (Intent::Chat, json!("not an object")),
            (Intent::Chat, json!({"candidates": "nope"})),
            (Intent::Generate, json!([1, 2, 3])),
            (Intent::Generate, json!({"predictions": [{"bytesBase64Encoded": "%%%"}]})),
            (
                Intent::Edit,
                json!({"candidates": [{"content": {"parts": [
                    {"inlineData": {"mimeType": "image/png", "data": "***"}}
                ]}}]}),
            ),
        ];
        for (intent, body) in cases {
            let reply = normalize(intent, Ok(body.clone()));
            assert!(reply.failed, "{intent:?} {body}");
            assert_eq!(reply.text.as_deref(), Some(captions::CONNECTION_ERROR));
            assert!(reply.image.is_none());
        }
    }
}
