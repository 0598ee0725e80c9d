use crate::conversation::{Attachment, Role, Turn};
use crate::wire::gemini::{Content, Part};

pub const DEFAULT_CONTEXT_LIMIT: usize = 10;

/// Prompt sent with an image when the user typed nothing.
pub const DEFAULT_VISION_PROMPT: &str = "O que é isso?";

/// The image travelling with the turn being sent.
#[derive(Debug, Clone, Copy)]
pub struct CurrentAttachment<'a> {
    pub text: &'a str,
    pub attachment: &'a Attachment,
}

/// Builds the `contents` array for the chat backend.
///
/// Transient turns are dropped, the last `limit` turns are kept in order and
/// each becomes one text-only entry. When the turn being sent carries an
/// image, the final user entry is rebuilt as a single text + image entry
/// rather than gaining a second entry.
pub fn build_chat_context(
    history: &[Turn],
    limit: usize,
    current: Option<CurrentAttachment<'_>>,
) -> Vec<Content> {
    if limit == 0 {
        return Vec::new();
    }

    let settled: Vec<&Turn> = history.iter().filter(|turn| !turn.is_transient()).collect();
    let start = settled.len().saturating_sub(limit);
    let mut contents: Vec<Content> = settled[start..]
        .iter()
        .map(|turn| {
            Content::new(
                Some(turn.role().backend_label()),
                vec![Part::text(turn.text().unwrap_or_default())],
            )
        })
        .collect();

    if let Some(current) = current {
        let prompt = if current.text.trim().is_empty() {
            DEFAULT_VISION_PROMPT
        } else {
            current.text
        };
        let multimodal = Content::new(
            Some(Role::User.backend_label()),
            vec![Part::text(prompt), current.attachment.inline_part()],
        );
        let last_is_user = contents
            .last()
            .map(|entry| entry.role.as_deref() == Some(Role::User.backend_label()))
            .unwrap_or(false);
        if last_is_user {
            contents.pop();
        } else if contents.len() == limit {
            contents.remove(0);
        }
        contents.push(multimodal);
    }

    contents
}
