use crate::models::Conversation;

/// In-memory collection of conversations with one active selection.
/// Nothing here survives a restart; persistence is out of scope.
#[derive(Debug)]
pub struct ChatStore {
    conversations: Vec<Conversation>,
    active_id: String,
}

impl ChatStore {
    /// Starts with a single empty conversation so the client always has
    /// somewhere to submit to.
    pub fn new() -> Self {
        let initial = Conversation::new();
        let active_id = initial.id.clone();
        Self { conversations: vec![initial], active_id }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn active(&self) -> &Conversation {
        self.conversations
            .iter()
            .find(|c| c.id == self.active_id)
            .unwrap_or(&self.conversations[0])
    }

    pub fn active_mut(&mut self) -> &mut Conversation {
        let idx = self
            .conversations
            .iter()
            .position(|c| c.id == self.active_id)
            .unwrap_or(0);
        &mut self.conversations[idx]
    }

    /// Creates a fresh conversation, places it first and makes it active.
    pub fn new_chat(&mut self) -> &Conversation {
        let conv = Conversation::new();
        self.active_id = conv.id.clone();
        self.conversations.insert(0, conv);
        &self.conversations[0]
    }

    /// Selects an existing conversation; returns false for unknown ids.
    pub fn select(&mut self, id: &str) -> bool {
        if self.conversations.iter().any(|c| c.id == id) {
            self.active_id = id.to_string();
            true
        } else {
            false
        }
    }

    /// Removes a conversation. The last remaining conversation cannot be
    /// deleted; deleting the active one falls back to the first remaining.
    pub fn delete(&mut self, id: &str) -> bool {
        if self.conversations.len() == 1 {
            return false;
        }
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.conversations.len() == before {
            return false;
        }
        if self.active_id == id {
            self.active_id = self.conversations[0].id.clone();
        }
        true
    }
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chat_is_prepended_and_active() {
        let mut store = ChatStore::new();
        let first_id = store.active().id.clone();

        let new_id = store.new_chat().id.clone();
        assert_eq!(store.conversations().len(), 2);
        assert_eq!(store.conversations()[0].id, new_id);
        assert_eq!(store.active().id, new_id);
        assert_ne!(new_id, first_id);
    }

    #[test]
    fn last_conversation_cannot_be_deleted() {
        let mut store = ChatStore::new();
        let id = store.active().id.clone();
        assert!(!store.delete(&id));
        assert_eq!(store.conversations().len(), 1);
    }

    #[test]
    fn deleting_active_falls_back_to_first_remaining() {
        let mut store = ChatStore::new();
        let old_id = store.active().id.clone();
        let new_id = store.new_chat().id.clone();

        assert!(store.delete(&new_id));
        assert_eq!(store.active().id, old_id);
    }

    #[test]
    fn select_rejects_unknown_id() {
        let mut store = ChatStore::new();
        assert!(!store.select("nope"));
        let id = store.active().id.clone();
        assert!(store.select(&id));
    }
}
