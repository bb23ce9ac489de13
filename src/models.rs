use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to a conversation before any message has been sent.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Number of characters of the first message kept when deriving a title.
const TITLE_PREFIX_LEN: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transcript entry. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into(), created_at: Utc::now() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: MessageRole::Assistant, content: content.into(), created_at: Utc::now() }
    }
}

/// Derives a conversation title from the first message's content:
/// a fixed-length character prefix with an ellipsis marker.
pub fn derive_title(content: &str) -> String {
    let prefix: String = content.chars().take(TITLE_PREFIX_LEN).collect();
    format!("{prefix}...")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Appends a message and refreshes the title. The title always tracks the
    /// first message, so it settles once the transcript becomes non-empty and
    /// later messages leave it untouched.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.refresh_title();
    }

    pub fn refresh_title(&mut self) {
        if let Some(first) = self.messages.first() {
            self.title = derive_title(&first.content);
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_truncated_prefix_with_ellipsis() {
        let long = "a".repeat(80);
        let title = derive_title(&long);
        assert_eq!(title, format!("{}...", "a".repeat(30)));
    }

    #[test]
    fn title_truncation_is_char_safe() {
        let content = "日本語のとても長いタイトルを持つ最初のメッセージで、三十文字を超える内容です";
        let title = derive_title(content);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 30 + 3);
    }

    #[test]
    fn first_message_sets_title_second_does_not_change_it() {
        let mut conv = Conversation::new();
        assert_eq!(conv.title, DEFAULT_TITLE);

        conv.push(Message::user("What is the capital of France?"));
        let derived = conv.title.clone();
        assert!(derived.starts_with("What is the capital of France"));
        assert!(derived.ends_with("..."));

        conv.push(Message::assistant("Paris"));
        assert_eq!(conv.title, derived);
    }

    #[test]
    fn empty_conversation_keeps_prior_title() {
        let mut conv = Conversation::new();
        conv.refresh_title();
        assert_eq!(conv.title, DEFAULT_TITLE);
    }
}
