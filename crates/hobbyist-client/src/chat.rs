//! Client-side chat thread state.
//!
//! The server has no push channel, so the shell polls on a fixed interval
//! and inserts sent messages optimistically.  The polling cadence stays
//! the embedder's concern; this type only owns the merge rules:
//!
//! - an optimistic entry is replaced by the server's copy on acknowledge
//!   and removed on failure;
//! - a poll adopts the authoritative list wholesale and re-appends
//!   still-pending entries, so a just-acknowledged message can show twice
//!   for one cycle.  That brief duplicate/flicker window is accepted
//!   rather than papered over with sequence numbers.

use chrono::Utc;
use uuid::Uuid;

use hobbyist_shared::types::{ChatMessage, MemberProfile};

pub struct ChatThread {
    hobby_id: Uuid,
    /// Server-confirmed history, oldest first.
    messages: Vec<ChatMessage>,
    /// Optimistic local entries awaiting acknowledgement.
    pending: Vec<ChatMessage>,
}

impl ChatThread {
    pub fn new(hobby_id: Uuid) -> Self {
        Self {
            hobby_id,
            messages: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn hobby_id(&self) -> Uuid {
        self.hobby_id
    }

    /// What the UI renders: confirmed history plus pending entries at the
    /// tail.
    pub fn visible(&self) -> Vec<&ChatMessage> {
        self.messages.iter().chain(self.pending.iter()).collect()
    }

    /// Insert a local placeholder before the POST round-trips.  Returns
    /// the local id to pass to [`confirm`](Self::confirm) or
    /// [`reject`](Self::reject).
    pub fn optimistic_insert(&mut self, sender: MemberProfile, content: &str) -> Uuid {
        let local = ChatMessage {
            id: Uuid::new_v4(),
            hobby_id: self.hobby_id,
            sender,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        let local_id = local.id;
        self.pending.push(local);
        local_id
    }

    /// The server acknowledged the send: swap the placeholder for the
    /// authoritative copy (unless a poll already delivered it).
    pub fn confirm(&mut self, local_id: Uuid, actual: ChatMessage) {
        self.pending.retain(|m| m.id != local_id);
        if !self.messages.iter().any(|m| m.id == actual.id) {
            self.messages.push(actual);
        }
    }

    /// The send failed: drop the placeholder so the user can retry.
    pub fn reject(&mut self, local_id: Uuid) {
        self.pending.retain(|m| m.id != local_id);
    }

    /// Adopt a fresh poll result as the confirmed history.
    pub fn apply_poll(&mut self, authoritative: Vec<ChatMessage>) {
        self.messages = authoritative;
    }
}
