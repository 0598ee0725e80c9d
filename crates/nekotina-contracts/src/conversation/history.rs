use super::turn::Turn;

/// Conversation history owned by a single orchestrator.
///
/// Settled turns live in an append-only vector. The in-flight placeholder has
/// its own slot, so there is never more than one transient turn and it can
/// never end up in the settled history.
#[derive(Debug, Clone)]
pub struct Conversation {
    settled: Vec<Turn>,
    placeholder: Option<Turn>,
}

impl Conversation {
    pub fn new(greeting: &str) -> Self {
        let mut conversation = Self {
            settled: Vec::new(),
            placeholder: None,
        };
        conversation.reset(greeting);
        conversation
    }

    /// Drops every turn and starts over with a single greeting.
    pub fn reset(&mut self, greeting: &str) {
        self.settled.clear();
        self.placeholder = None;
        if let Some(turn) = Turn::assistant(Some(greeting.to_string()), None) {
            self.settled.push(turn);
        }
    }

    /// Appends a settled turn. Any placeholder is removed first; a transient
    /// turn takes the placeholder slot instead of joining the history.
    pub fn push(&mut self, turn: Turn) -> &Turn {
        if turn.is_transient() {
            return self.placeholder.insert(turn);
        }
        self.placeholder = None;
        self.settled.push(turn);
        &self.settled[self.settled.len() - 1]
    }

    pub fn show_placeholder(&mut self, caption: &str) -> &Turn {
        self.placeholder.insert(Turn::placeholder(caption))
    }

    /// Idempotent.
    pub fn clear_placeholder(&mut self) -> Option<Turn> {
        self.placeholder.take()
    }

    pub fn settled(&self) -> &[Turn] {
        &self.settled
    }

    pub fn placeholder(&self) -> Option<&Turn> {
        self.placeholder.as_ref()
    }

    /// Everything a renderer should draw, in order.
    pub fn turns(&self) -> impl Iterator<Item = &Turn> + '_ {
        self.settled.iter().chain(self.placeholder.iter())
    }

    pub fn last(&self) -> Option<&Turn> {
        self.placeholder.as_ref().or_else(|| self.settled.last())
    }

    pub fn len(&self) -> usize {
        self.settled.len() + usize::from(self.placeholder.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
