use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::image_ref::ImageRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role label understood by the chat backend.
    pub fn backend_label(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Presentation hint only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    Text,
    Image,
}

/// One message in the conversation.
///
/// Settled turns always carry text or an image. Placeholder turns are
/// transient and carry only a status caption.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    id: String,
    role: Role,
    text: Option<String>,
    image: Option<ImageRef>,
    transient: bool,
    failed: bool,
    created_at: String,
}

impl Turn {
    fn build(
        role: Role,
        text: Option<String>,
        image: Option<ImageRef>,
        transient: bool,
        failed: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.filter(|value| !value.is_empty()),
            image: image.filter(|value| !value.is_empty()),
            transient,
            failed,
            created_at: now_utc_iso(),
        }
    }

    /// Returns `None` when there is neither text nor image to send.
    pub fn user(text: impl Into<String>, image: Option<ImageRef>) -> Option<Self> {
        let turn = Self::build(Role::User, Some(text.into()), image, false, false);
        turn.has_content().then_some(turn)
    }

    /// Returns `None` when there is neither text nor image to show.
    pub fn assistant(text: Option<String>, image: Option<ImageRef>) -> Option<Self> {
        let turn = Self::build(Role::Assistant, text, image, false, false);
        turn.has_content().then_some(turn)
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self::build(Role::Assistant, Some(text.into()), None, false, true)
    }

    pub fn placeholder(caption: impl Into<String>) -> Self {
        Self::build(Role::Assistant, Some(caption.into()), None, true, false)
    }

    fn has_content(&self) -> bool {
        self.text.is_some() || self.image.is_some()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    pub fn kind(&self) -> TurnKind {
        if self.image.is_some() {
            TurnKind::Image
        } else {
            TurnKind::Text
        }
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
