use std::path::Path;

use nekotina_contracts::chat::{
    build_chat_context, CurrentAttachment, Intent, IntentPolicy, KeywordIntentPolicy,
};
use nekotina_contracts::conversation::{Attachment, Conversation, Turn};
use nekotina_contracts::events::EventWriter;
use serde_json::{json, Map, Value};

use crate::attachment::{attachment_fingerprint, encode_bytes, encode_file, AttachmentReadError};
use crate::backend::{Backend, BackendTransportError};
use crate::captions;
use crate::config::OrchestratorSettings;
use crate::normalize::normalize;
use crate::requests::{
    build_chat_request, build_edit_request, build_generate_request, BackendRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Idle,
    Sending,
}

impl SendState {
    pub fn as_str(self) -> &'static str {
        match self {
            SendState::Idle => "idle",
            SendState::Sending => "sending",
        }
    }
}

/// A submitted turn waiting for its backend result. Only
/// [`TurnOrchestrator::begin_submit`] creates one.
#[derive(Debug)]
pub struct PendingSend {
    turn_id: String,
    intent: Intent,
    request: BackendRequest,
}

impl PendingSend {
    /// Id of the user turn this send answers.
    pub fn turn_id(&self) -> &str {
        &self.turn_id
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn request(&self) -> &BackendRequest {
        &self.request
    }
}

/// Owns one conversation and drives each user turn through classification,
/// request building, the backend call and reply normalization.
///
/// A submit appends the user turn, at most one placeholder, then exactly one
/// settled assistant turn. While a turn is in flight further submits and
/// resets are refused.
pub struct TurnOrchestrator {
    settings: OrchestratorSettings,
    policy: Box<dyn IntentPolicy>,
    conversation: Conversation,
    pending_attachment: Option<Attachment>,
    /// User turn id of the send in flight.
    in_flight: Option<String>,
    events: Option<EventWriter>,
}

impl TurnOrchestrator {
    pub fn new(settings: OrchestratorSettings) -> Self {
        let conversation = Conversation::new(&settings.greeting);
        Self {
            settings,
            policy: Box::new(KeywordIntentPolicy::default()),
            conversation,
            pending_attachment: None,
            in_flight: None,
            events: None,
        }
    }

    pub fn with_policy(mut self, policy: Box<dyn IntentPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_events(mut self, events: EventWriter) -> Self {
        self.events = Some(events);
        self.emit(
            "conversation_started",
            json!({
                "generate_model": self.settings.models.generate,
                "edit_model": self.settings.models.edit,
                "chat_model": self.settings.models.chat,
                "context_limit": self.settings.context_limit,
            }),
        );
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Turns in display order, placeholder last.
    pub fn turns(&self) -> impl Iterator<Item = &Turn> + '_ {
        self.conversation.turns()
    }

    pub fn pending_attachment(&self) -> Option<&Attachment> {
        self.pending_attachment.as_ref()
    }

    pub fn state(&self) -> SendState {
        if self.in_flight.is_some() {
            SendState::Sending
        } else {
            SendState::Idle
        }
    }

    pub fn input_hint(&self) -> &'static str {
        if self.pending_attachment.is_some() {
            captions::INPUT_HINT_WITH_ATTACHMENT
        } else {
            captions::INPUT_HINT
        }
    }

    /// Encodes `path` as the attachment for the next turn. On failure the
    /// pending slot is left empty.
    pub fn select_attachment(&mut self, path: &Path) -> Result<&Attachment, AttachmentReadError> {
        let encoded = encode_file(path);
        self.store_attachment(encoded, Some(path))
    }

    pub fn select_attachment_bytes(
        &mut self,
        bytes: Vec<u8>,
        declared_type: Option<&str>,
    ) -> Result<&Attachment, AttachmentReadError> {
        let encoded = encode_bytes(bytes, declared_type);
        self.store_attachment(encoded, None)
    }

    fn store_attachment(
        &mut self,
        encoded: Result<Attachment, AttachmentReadError>,
        path: Option<&Path>,
    ) -> Result<&Attachment, AttachmentReadError> {
        self.pending_attachment = None;
        let attachment = encoded?;
        self.emit(
            "attachment_selected",
            json!({
                "path": path.map(|value| value.display().to_string()),
                "media_type": attachment.media_type(),
                "bytes": attachment.byte_len(),
                "sha256": attachment_fingerprint(&attachment),
            }),
        );
        let stored = self.pending_attachment.insert(attachment);
        Ok(&*stored)
    }

    pub fn clear_attachment(&mut self) -> Option<Attachment> {
        let cleared = self.pending_attachment.take();
        if cleared.is_some() {
            self.emit("attachment_cleared", json!({}));
        }
        cleared
    }

    /// First half of a submit: records the user turn, shows the placeholder
    /// for image operations and builds the backend request.
    ///
    /// Returns `None` without touching the conversation when there is nothing
    /// to send or another turn is still in flight.
    pub fn begin_submit(&mut self, text: &str) -> Option<PendingSend> {
        let text = text.trim();
        if self.in_flight.is_some() {
            self.emit("submit_rejected", json!({"reason": "busy"}));
            return None;
        }
        let image = self
            .pending_attachment
            .as_ref()
            .map(|attachment| attachment.preview().clone());
        let Some(user_turn) = Turn::user(text, image) else {
            self.emit("submit_rejected", json!({"reason": "empty"}));
            return None;
        };

        let attachment = self.pending_attachment.take();
        let user_turn_id = self.conversation.push(user_turn).id().to_string();
        self.in_flight = Some(user_turn_id.clone());
        self.emit(
            "turn_submitted",
            json!({
                "turn_id": user_turn_id,
                "chars": text.chars().count(),
                "attachment": attachment.as_ref().map(|value| json!({
                    "media_type": value.media_type(),
                    "bytes": value.byte_len(),
                    "sha256": attachment_fingerprint(value),
                })),
            }),
        );

        let classified = self.policy.classify(text, attachment.is_some());
        let intent = match (classified, attachment.as_ref()) {
            (Intent::Edit, None) => Intent::Chat,
            (intent, _) => intent,
        };
        self.emit(
            "intent_classified",
            json!({
                "intent": intent.as_str(),
                "classified": classified.as_str(),
                "has_attachment": attachment.is_some(),
            }),
        );

        if intent.shows_placeholder() {
            let caption = if intent == Intent::Edit {
                captions::EDIT_PLACEHOLDER
            } else {
                captions::GENERATE_PLACEHOLDER
            };
            self.conversation.show_placeholder(caption);
        }

        let request = self.build_request(intent, text, attachment.as_ref());
        self.emit(
            "backend_request",
            json!({
                "intent": intent.as_str(),
                "model": request.model(),
                "endpoint": request.endpoint_path(),
                "context_entries": request.context_len(),
            }),
        );
        Some(PendingSend {
            turn_id: user_turn_id,
            intent,
            request,
        })
    }

    fn build_request(
        &self,
        intent: Intent,
        text: &str,
        attachment: Option<&Attachment>,
    ) -> BackendRequest {
        let model = self.settings.models.for_intent(intent).to_string();
        match (intent, attachment) {
            (Intent::Generate, _) => BackendRequest::Generate {
                model,
                body: build_generate_request(text),
            },
            (Intent::Edit, Some(attachment)) => BackendRequest::Edit {
                model,
                body: build_edit_request(text, attachment),
            },
            (Intent::Edit, None) | (Intent::Chat, _) => {
                let current = attachment.map(|attachment| CurrentAttachment { text, attachment });
                let contents = build_chat_context(
                    self.conversation.settled(),
                    self.settings.context_limit,
                    current,
                );
                BackendRequest::Chat {
                    model,
                    body: build_chat_request(contents, &self.settings.system_prompt),
                }
            }
        }
    }

    /// Second half of a submit: removes the placeholder and appends the one
    /// assistant turn for `pending`, returning to [`SendState::Idle`].
    ///
    /// A `pending` that is not the send in flight (already completed, or
    /// begun on another orchestrator) is refused and changes nothing.
    pub fn complete_submit(
        &mut self,
        pending: PendingSend,
        result: Result<Value, BackendTransportError>,
    ) -> Option<&Turn> {
        if self.in_flight.as_deref() != Some(pending.turn_id.as_str()) {
            self.emit(
                "submit_rejected",
                json!({"reason": "stale_pending", "turn_id": pending.turn_id}),
            );
            return None;
        }
        let transport = result.as_ref().err().map(|err| err.kind().as_str());
        let reply = normalize(pending.intent, result);
        self.emit(
            "backend_response",
            json!({
                "intent": pending.intent.as_str(),
                "model": pending.request.model(),
                "outcome": reply.outcome.as_str(),
                "transport_error": transport,
                "detail": reply.detail,
            }),
        );

        self.conversation.clear_placeholder();
        let turn = if reply.failed {
            Turn::failure(captions::CONNECTION_ERROR)
        } else {
            // Replies always carry a caption, so this only guards the type.
            Turn::assistant(reply.text, reply.image)
                .unwrap_or_else(|| Turn::failure(captions::CONNECTION_ERROR))
        };
        let payload = json!({
            "turn_id": turn.id(),
            "role": turn.role().as_str(),
            "in_reply_to": pending.turn_id,
            "kind": turn.kind(),
            "failed": turn.is_failed(),
            "has_image": turn.image().is_some(),
            "image_media_type": turn.image().map(|image| image.media_type()),
            "image_bytes": turn.image().map(|image| image.len()),
        });
        self.conversation.push(turn);
        self.in_flight = None;
        self.emit("reply_appended", payload);
        self.conversation.last()
    }

    /// Runs a whole submit against `backend`, blocking until it answers.
    pub fn submit(&mut self, backend: &dyn Backend, text: &str) -> Option<&Turn> {
        let pending = self.begin_submit(text)?;
        let result = backend.execute(pending.request());
        self.complete_submit(pending, result)
    }

    /// Starts over with the reset greeting. Refused while a turn is in
    /// flight; the pending attachment survives.
    pub fn reset_conversation(&mut self) -> bool {
        if self.in_flight.is_some() {
            self.emit("submit_rejected", json!({"reason": "reset_while_sending"}));
            return false;
        }
        let dropped = self.conversation.len();
        self.conversation.reset(&self.settings.reset_greeting);
        self.emit("conversation_reset", json!({"dropped_turns": dropped}));
        true
    }

    fn emit(&self, event_type: &str, payload: Value) {
        let Some(events) = self.events.as_ref() else {
            return;
        };
        if let Err(err) = events.emit(event_type, map_object(payload)) {
            eprintln!("nekotina events: {err:#}");
        }
    }
}

fn map_object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
