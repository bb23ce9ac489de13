use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::errors::ChatError;
use crate::models::Message;
use crate::service::{ChatSubmitter, RequestObserver, RequestState, GENERIC_FAILURE_NOTICE};
use crate::transport::DirectApi;

/// Single-call submission strategy: one query in, one answer out. No
/// sessions, no progress log. Mutually exclusive with the polling flow.
pub struct DirectChatService {
    api: Arc<dyn DirectApi>,
    observer: Arc<dyn RequestObserver>,
    busy: Arc<AtomicBool>,
    state: Arc<Mutex<RequestState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DirectChatService {
    pub fn new(api: Arc<dyn DirectApi>, observer: Arc<dyn RequestObserver>) -> Self {
        Self {
            api,
            observer,
            busy: Arc::new(AtomicBool::new(false)),
            state: Arc::new(Mutex::new(RequestState::Idle)),
            task: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ChatSubmitter for DirectChatService {
    fn submit(&self, transcript: &[Message], text: &str) -> Result<(), ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ChatError::RequestInFlight);
        }

        // The direct flow has no session phase; Routing covers the one call.
        *self.state.lock().unwrap() = RequestState::Routing;

        let mut messages = transcript.to_vec();
        messages.push(Message::user(text));
        self.observer.busy_changed(true);
        self.observer.transcript_replaced(&messages);

        let api = Arc::clone(&self.api);
        let observer = Arc::clone(&self.observer);
        let busy = Arc::clone(&self.busy);
        let state = Arc::clone(&self.state);
        let query = text.to_string();

        let handle = tokio::spawn(async move {
            let (reply, outcome) = match api.ask(&query).await {
                Ok(answer) => (Message::assistant(answer), RequestState::Completed),
                Err(e) => {
                    warn!("Direct inference failed: {e}");
                    (Message::assistant(GENERIC_FAILURE_NOTICE), RequestState::Failed)
                }
            };
            // Busy is released last: an idle observation always implies the
            // terminal transcript has already been delivered.
            messages.push(reply);
            *state.lock().unwrap() = outcome;
            observer.transcript_replaced(&messages);
            observer.busy_changed(false);
            busy.store(false, Ordering::Release);
        });
        if let Some(stale) = self.task.lock().unwrap().replace(handle) {
            stale.abort();
        }
        Ok(())
    }

    async fn wait_for_idle(&self) {
        let handle = self.task.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn state(&self) -> RequestState {
        *self.state.lock().unwrap()
    }
}

impl Drop for DirectChatService {
    fn drop(&mut self) {
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;

    struct CannedApi {
        answer: Result<String, ()>,
    }

    #[async_trait]
    impl DirectApi for CannedApi {
        async fn ask(&self, _query: &str) -> Result<String, ChatError> {
            self.answer
                .clone()
                .map_err(|_| ChatError::inference("connection refused"))
        }
    }

    #[derive(Default)]
    struct Recorder {
        transcripts: Mutex<Vec<Vec<Message>>>,
    }

    impl RequestObserver for Recorder {
        fn transcript_replaced(&self, messages: &[Message]) {
            self.transcripts.lock().unwrap().push(messages.to_vec());
        }

        fn logs_appended(&self, _lines: &[String]) {}

        fn busy_changed(&self, _busy: bool) {}
    }

    #[tokio::test]
    async fn answer_becomes_the_assistant_message() {
        let api = Arc::new(CannedApi { answer: Ok("Paris".to_string()) });
        let rec = Arc::new(Recorder::default());
        let svc = DirectChatService::new(api, Arc::clone(&rec) as Arc<dyn RequestObserver>);

        svc.submit(&[], "capital of France?").unwrap();
        svc.wait_for_idle().await;

        let transcripts = rec.transcripts.lock().unwrap().clone();
        assert_eq!(transcripts.len(), 2);
        let last = transcripts.last().unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].role, MessageRole::User);
        assert_eq!(last[1].role, MessageRole::Assistant);
        assert_eq!(last[1].content, "Paris");
        assert_eq!(svc.state(), RequestState::Completed);
        assert!(!svc.is_busy());
    }

    #[tokio::test]
    async fn busy_is_released_only_after_terminal_delivery() {
        use std::sync::Weak;

        /// Observer that tries to submit again the moment it is told the
        /// request went idle.
        #[derive(Default)]
        struct EagerResubmitter {
            service: Mutex<Option<Weak<DirectChatService>>>,
            transcripts: Mutex<Vec<Vec<Message>>>,
            outcome: Mutex<Option<Result<(), ChatError>>>,
        }

        impl RequestObserver for EagerResubmitter {
            fn transcript_replaced(&self, messages: &[Message]) {
                self.transcripts.lock().unwrap().push(messages.to_vec());
            }

            fn logs_appended(&self, _lines: &[String]) {}

            fn busy_changed(&self, busy: bool) {
                if busy {
                    return;
                }
                let svc = self.service.lock().unwrap().clone();
                if let Some(svc) = svc.and_then(|weak| weak.upgrade()) {
                    *self.outcome.lock().unwrap() = Some(svc.submit(&[], "follow-up"));
                }
            }
        }

        let api = Arc::new(CannedApi { answer: Ok("Paris".to_string()) });
        let eager = Arc::new(EagerResubmitter::default());
        let svc = Arc::new(DirectChatService::new(
            api,
            Arc::clone(&eager) as Arc<dyn RequestObserver>,
        ));
        *eager.service.lock().unwrap() = Some(Arc::downgrade(&svc));

        svc.submit(&[], "capital of France?").unwrap();
        svc.wait_for_idle().await;

        // The reentrant submission is rejected; the terminal transcript was
        // already delivered when idle became observable.
        assert!(matches!(
            *eager.outcome.lock().unwrap(),
            Some(Err(ChatError::RequestInFlight))
        ));
        let transcripts = eager.transcripts.lock().unwrap().clone();
        assert_eq!(transcripts.last().unwrap()[1].content, "Paris");
        assert!(!svc.is_busy());
    }

    #[tokio::test]
    async fn call_failure_surfaces_the_generic_notice() {
        let api = Arc::new(CannedApi { answer: Err(()) });
        let rec = Arc::new(Recorder::default());
        let svc = DirectChatService::new(api, Arc::clone(&rec) as Arc<dyn RequestObserver>);

        svc.submit(&[], "hi").unwrap();
        svc.wait_for_idle().await;

        let transcripts = rec.transcripts.lock().unwrap().clone();
        assert_eq!(transcripts.last().unwrap()[1].content, GENERIC_FAILURE_NOTICE);
        assert_eq!(svc.state(), RequestState::Failed);
        assert!(!svc.is_busy());
    }
}
