use serde::Serialize;

/// Backend operation selected for a user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Generate,
    Edit,
    Chat,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Generate => "generate",
            Intent::Edit => "edit",
            Intent::Chat => "chat",
        }
    }

    /// Image operations are slow enough to warrant a placeholder turn.
    pub fn shows_placeholder(self) -> bool {
        matches!(self, Intent::Generate | Intent::Edit)
    }
}

/// Decides which backend operation a turn is routed to.
pub trait IntentPolicy: Send + Sync {
    fn classify(&self, text: &str, has_attachment: bool) -> Intent;
}

const EDIT_KEYWORDS: &[&str] = &["edit", "mud", "alter", "transform", "troc"];

const CREATION_KEYWORDS: &[&str] = &[
    "cri", "ger", "desenh", "faze", "make", "draw", "generate",
];

/// Case-insensitive substring matching against two fixed vocabularies.
///
/// The edit vocabulary only applies with an attachment and the creation
/// vocabulary only without one, so the two rules never compete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordIntentPolicy {
    edit_keywords: Vec<String>,
    creation_keywords: Vec<String>,
}

impl KeywordIntentPolicy {
    pub fn new<E, C>(edit_keywords: E, creation_keywords: C) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            edit_keywords: normalize_keywords(edit_keywords),
            creation_keywords: normalize_keywords(creation_keywords),
        }
    }
}

impl Default for KeywordIntentPolicy {
    fn default() -> Self {
        Self::new(EDIT_KEYWORDS, CREATION_KEYWORDS)
    }
}

impl IntentPolicy for KeywordIntentPolicy {
    fn classify(&self, text: &str, has_attachment: bool) -> Intent {
        let haystack = text.to_lowercase();
        if has_attachment && contains_any(&haystack, &self.edit_keywords) {
            return Intent::Edit;
        }
        if !has_attachment && contains_any(&haystack, &self.creation_keywords) {
            return Intent::Generate;
        }
        Intent::Chat
    }
}

/// Classifies with the default keyword vocabularies.
pub fn classify(text: &str, has_attachment: bool) -> Intent {
    KeywordIntentPolicy::default().classify(text, has_attachment)
}

fn normalize_keywords<I>(keywords: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|keyword| keyword.as_ref().trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_phrases_route_as_expected() {
        assert_eq!(classify("crie um gato", false), Intent::Generate);
        assert_eq!(classify("desenha um gato astronauta", false), Intent::Generate);
        assert_eq!(classify("edita essa foto", true), Intent::Edit);
        assert_eq!(classify("oi, como vc tá", false), Intent::Chat);
        assert_eq!(classify("o que é isso", true), Intent::Chat);
        assert_eq!(classify("", true), Intent::Chat);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("DRAW a dragon", false), Intent::Generate);
        assert_eq!(classify("Troca o fundo", true), Intent::Edit);
        assert_eq!(classify("TRANSFORMA em anime", true), Intent::Edit);
    }

    #[test]
    fn attachment_gates_each_vocabulary() {
        assert_eq!(classify("gera uma paisagem", true), Intent::Chat);
        assert_eq!(classify("muda a cor", false), Intent::Chat);
    }

    #[test]
    fn blank_text_without_attachment_is_chat() {
        assert_eq!(classify("", false), Intent::Chat);
        assert_eq!(classify("   \n\t", false), Intent::Chat);
    }

    #[test]
    fn classification_is_deterministic() {
        let policy = KeywordIntentPolicy::default();
        let inputs = [
            ("crie um gato", false),
            ("edita essa foto", true),
            ("oi", false),
            ("", true),
            ("make it pop", true),
        ];
        for (text, has_attachment) in inputs {
            let first = policy.classify(text, has_attachment);
            for _ in 0..5 {
                assert_eq!(policy.classify(text, has_attachment), first);
            }
        }
    }

    #[test]
    fn custom_vocabularies_replace_the_defaults() {
        let policy = KeywordIntentPolicy::new(["Recolor"], ["  Imagine "]);
        assert_eq!(policy.classify("imagine a castle", false), Intent::Generate);
        assert_eq!(policy.classify("crie um gato", false), Intent::Chat);
        assert_eq!(policy.classify("recolor this", true), Intent::Edit);
        assert_eq!(policy.classify("", false), Intent::Chat);
    }

    #[test]
    fn only_image_operations_show_a_placeholder() {
        assert!(Intent::Generate.shows_placeholder());
        assert!(Intent::Edit.shows_placeholder());
        assert!(!Intent::Chat.shows_placeholder());
    }
}
