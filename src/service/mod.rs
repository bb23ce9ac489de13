pub mod direct;
pub mod lifecycle;

use async_trait::async_trait;

use crate::errors::ChatError;
use crate::models::Message;

/// Assistant notice used when a request cannot be sent at all.
pub const GENERIC_FAILURE_NOTICE: &str = "Error: Failed to send message";

/// Assistant content used when the service completes without an output.
pub const NO_RESPONSE_FALLBACK: &str = "No response received";

/// Where a conversation's single in-flight request currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    AwaitingSession,
    Routing,
    Completed,
    Failed,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Completed | RequestState::Failed)
    }
}

/// Display collaborator. The submitter pushes state changes out through this
/// trait; it never reads anything back.
pub trait RequestObserver: Send + Sync {
    /// The full updated message sequence for the conversation, never a delta.
    fn transcript_replaced(&self, messages: &[Message]);

    /// One batch of newly delivered progress-log lines. Lines already
    /// delivered for the current request are never repeated.
    fn logs_appended(&self, lines: &[String]);

    /// Drives the input-disable affordance.
    fn busy_changed(&self, busy: bool);
}

/// One interface over the two mutually exclusive submission strategies:
/// the session-scoped polling flow and the single-call direct flow.
#[async_trait]
pub trait ChatSubmitter: Send + Sync {
    /// Starts one request for `text` on top of the given transcript snapshot.
    /// Appends the user message synchronously (via the observer) and runs the
    /// rest of the request in the background.
    fn submit(&self, transcript: &[Message], text: &str) -> Result<(), ChatError>;

    /// Waits until the in-flight request (if any) reaches a terminal state.
    async fn wait_for_idle(&self);

    fn is_busy(&self) -> bool;

    fn state(&self) -> RequestState;
}
