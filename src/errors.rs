use thiserror::Error;

/// Top-level client error. All variants carry a human-readable message for
/// display/logging; the lifecycle controller decides which ones become
/// assistant-authored chat messages and which stay diagnostic-only.
#[derive(Debug, Error)]
pub enum ChatError {
    // ── Submission guards ────────────────────────────────────────────────────
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("A request is already in flight for this conversation")]
    RequestInFlight,

    // ── Request lifecycle errors ─────────────────────────────────────────────
    #[error("Session creation failed: {message}")]
    SessionCreation { message: String },

    #[error("Routing trigger failed: {message}")]
    Trigger { message: String },

    #[error("Status poll failed: {message}")]
    PollTransport { message: String },

    #[error("Routing failed: {message}")]
    Remote { message: String },

    // ── Direct-strategy errors ───────────────────────────────────────────────
    #[error("Inference call failed: {message}")]
    Inference { message: String },
}

impl ChatError {
    pub fn session(message: impl Into<String>) -> Self {
        ChatError::SessionCreation { message: message.into() }
    }

    pub fn trigger(message: impl Into<String>) -> Self {
        ChatError::Trigger { message: message.into() }
    }

    pub fn poll(message: impl Into<String>) -> Self {
        ChatError::PollTransport { message: message.into() }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        ChatError::Remote { message: message.into() }
    }

    pub fn inference(message: impl Into<String>) -> Self {
        ChatError::Inference { message: message.into() }
    }

    /// Transient errors are retried on the next poll tick and never surface
    /// in the transcript.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChatError::PollTransport { .. })
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, ChatError::EmptyMessage | ChatError::RequestInFlight)
    }
}
