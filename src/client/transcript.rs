//! Client-side view of a conversation with optimistic updates.
//!
//! A user message is shown as soon as it is sent. When the server replies
//! the entry is settled and the reply appended after it, when the request
//! fails the entry is removed again so the transcript matches what the
//! server stored.

use crate::chat::models::{Conversation, Role};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingId(u64);

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub role: Role,
    pub text: String,
    pub image_count: usize,
    pending: Option<PendingId>,
}

impl Entry {
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
    conversation_id: Option<String>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The id to continue the conversation with, `None` until the first
    /// reply arrived.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn push_pending(&mut self, text: &str, image_count: usize) -> PendingId {
        let id = PendingId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            role: Role::User,
            text: text.to_string(),
            image_count,
            pending: Some(id),
        });
        id
    }

    /// Settle a pending message with the server's reply. Returns `false`
    /// if `id` isn't pending.
    pub fn confirm(&mut self, id: PendingId, reply: &str, conversation_id: &str) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        self.entries[idx].pending = None;
        self.entries.insert(
            idx + 1,
            Entry {
                role: Role::Assistant,
                text: reply.to_string(),
                image_count: 0,
                pending: None,
            },
        );
        self.conversation_id = Some(conversation_id.to_string());
        true
    }

    /// Drop a pending message after a failed request.
    pub fn rollback(&mut self, id: PendingId) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        self.entries.remove(idx);
        true
    }

    fn position(&self, id: PendingId) -> Option<usize> {
        self.entries.iter().position(|e| e.pending == Some(id))
    }
}

impl From<&Conversation> for Transcript {
    fn from(conversation: &Conversation) -> Self {
        let entries = conversation
            .messages
            .iter()
            .map(|m| Entry {
                role: m.role,
                text: m.content.text(),
                image_count: m.images.len(),
                pending: None,
            })
            .collect();
        Self {
            entries,
            conversation_id: Some(conversation.id.clone()),
            next_id: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::models::Message;
    use chrono::Utc;

    #[test]
    fn test_confirm_settles_and_appends_reply() {
        let mut transcript = Transcript::new();
        let id = transcript.push_pending("hello", 0);
        assert!(transcript.entries()[0].is_pending());
        assert_eq!(transcript.conversation_id(), None);

        assert!(transcript.confirm(id, "hi!", "conv-1"));
        let entries = transcript.entries();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].is_pending());
        assert_eq!(entries[1].role, Role::Assistant);
        assert_eq!(entries[1].text, "hi!");
        assert_eq!(transcript.conversation_id(), Some("conv-1"));

        // Already settled
        assert!(!transcript.confirm(id, "again", "conv-1"));
        assert_eq!(transcript.entries().len(), 2);
    }

    #[test]
    fn test_rollback_restores_previous_state() {
        let mut transcript = Transcript::new();
        let first = transcript.push_pending("one", 0);
        transcript.confirm(first, "reply", "conv-1");
        let before = transcript.entries().to_vec();

        let second = transcript.push_pending("two", 1);
        assert_eq!(transcript.entries().len(), 3);
        assert!(transcript.rollback(second));

        assert_eq!(transcript.entries(), before.as_slice());
        assert_eq!(transcript.conversation_id(), Some("conv-1"));
        assert!(!transcript.rollback(second));
    }

    #[test]
    fn test_reply_goes_after_its_own_message() {
        let mut transcript = Transcript::new();
        let a = transcript.push_pending("a", 0);
        let b = transcript.push_pending("b", 0);

        transcript.confirm(a, "reply a", "c");
        transcript.rollback(b);

        let texts: Vec<&str> = transcript.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "reply a"]);
    }

    #[test]
    fn test_from_conversation() {
        let now = Utc::now();
        let conversation = Conversation {
            id: "conv-9".to_string(),
            title: "t".to_string(),
            messages: vec![Message::user("q", vec![]), Message::assistant("a")],
            created_at: now,
            updated_at: now,
        };
        let transcript = Transcript::from(&conversation);
        assert_eq!(transcript.conversation_id(), Some("conv-9"));
        assert_eq!(transcript.entries().len(), 2);
        assert!(transcript.entries().iter().all(|e| !e.is_pending()));
    }
}
