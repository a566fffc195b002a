use serde::{Deserialize, Serialize};

use super::message::Message;

/// Default number of messages kept in a conversation window.
pub const DEFAULT_HISTORY_CAP: usize = 12;

/// The sliding conversation window sent to the model as context.
///
/// History is **append-only** from the caller's point of view: each turn adds
/// exactly one user message followed by one assistant message, after which the
/// oldest entries are dropped until the window fits the cap. Entries are never
/// reordered or edited.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed turn and trim to the most recent `cap` messages.
    pub fn push_turn(
        &mut self,
        user: impl Into<String>,
        assistant: impl Into<String>,
        cap: usize,
    ) {
        self.messages.push(Message::user(user));
        self.messages.push(Message::assistant(assistant));
        self.trim_to(cap);
    }

    /// Drop the oldest messages until at most `cap` remain.
    pub fn trim_to(&mut self, cap: usize) {
        if self.messages.len() > cap {
            let excess = self.messages.len() - cap;
            self.messages.drain(..excess);
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn push_turn_appends_user_then_assistant() {
        let mut history = History::new();
        history.push_turn("hola", "buenas", DEFAULT_HISTORY_CAP);

        assert_eq!(history.len(), 2);
        assert_eq!(history.messages()[0].role, Role::User);
        assert_eq!(history.messages()[0].content, "hola");
        assert_eq!(history.messages()[1].role, Role::Assistant);
        assert_eq!(history.messages()[1].content, "buenas");
    }

    #[test]
    fn never_exceeds_cap_and_drops_oldest_first() {
        let mut history = History::new();
        for i in 0..20 {
            history.push_turn(format!("q{}", i), format!("a{}", i), 12);
            assert!(history.len() <= 12);
        }

        let contents: Vec<&str> = history
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec![
                "q14", "a14", "q15", "a15", "q16", "a16", "q17", "a17", "q18", "a18", "q19",
                "a19"
            ]
        );
    }

    #[test]
    fn trim_keeps_recent_entries_in_original_order() {
        let mut history = History::new();
        history.push_turn("uno", "one", 100);
        history.push_turn("dos", "two", 100);
        history.push_turn("tres", "three", 100);

        history.trim_to(3);

        let contents: Vec<&str> = history
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["two", "tres", "three"]);
    }

    #[test]
    fn serializes_as_plain_message_array() {
        let mut history = History::new();
        history.push_turn("hola", "buenas", 12);

        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(json[0]["role"], "user");
        assert_eq!(json[1]["content"], "buenas");
    }
}
