use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::errors::ChatError;
use crate::models::Message;
use crate::service::{
    ChatSubmitter, RequestObserver, RequestState, GENERIC_FAILURE_NOTICE, NO_RESPONSE_FALLBACK,
};
use crate::transport::{RouteStatus, RoutingApi};

/// Drives one user message through the session-scoped routing flow:
/// create session → trigger routing → poll for progress and the terminal
/// result. One request at a time per conversation; submissions while busy
/// are rejected, not queued.
pub struct RequestLifecycleController {
    api: Arc<dyn RoutingApi>,
    observer: Arc<dyn RequestObserver>,
    poll_interval: Duration,
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// State visible outside the request task.
struct Shared {
    busy: AtomicBool,
    state: Mutex<RequestState>,
    progress_log: Mutex<Vec<String>>,
}

impl RequestLifecycleController {
    pub fn new(
        api: Arc<dyn RoutingApi>,
        observer: Arc<dyn RequestObserver>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            api,
            observer,
            poll_interval,
            shared: Arc::new(Shared {
                busy: AtomicBool::new(false),
                state: Mutex::new(RequestState::Idle),
                progress_log: Mutex::new(Vec::new()),
            }),
            task: Mutex::new(None),
        }
    }

    /// Progress-log lines delivered so far for the current request.
    pub fn progress_log(&self) -> Vec<String> {
        self.shared.progress_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatSubmitter for RequestLifecycleController {
    fn submit(&self, transcript: &[Message], text: &str) -> Result<(), ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self
            .shared
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ChatError::RequestInFlight);
        }

        *self.shared.state.lock().unwrap() = RequestState::AwaitingSession;
        self.shared.progress_log.lock().unwrap().clear();

        // Optimistic append: the user message lands before any network call.
        let mut messages = transcript.to_vec();
        messages.push(Message::user(text));
        self.observer.busy_changed(true);
        self.observer.transcript_replaced(&messages);

        let task = RequestTask {
            api: Arc::clone(&self.api),
            observer: Arc::clone(&self.observer),
            shared: Arc::clone(&self.shared),
            poll_interval: self.poll_interval,
            query: text.to_string(),
            messages,
        };
        let handle = tokio::spawn(task.run());
        if let Some(stale) = self.task.lock().unwrap().replace(handle) {
            // The busy guard guarantees the previous task already finished.
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
        self.shared.busy.load(Ordering::Acquire)
    }

    fn state(&self) -> RequestState {
        *self.shared.state.lock().unwrap()
    }
}

impl Drop for RequestLifecycleController {
    fn drop(&mut self) {
        // Abandonment path: tear down the poll loop with the controller so no
        // late tick can mutate anything after the owner is gone.
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
    }
}

/// Everything one request owns. Session id, delivered-count and log buffer
/// live and die with this task; nothing leaks into the next submit.
struct RequestTask {
    api: Arc<dyn RoutingApi>,
    observer: Arc<dyn RequestObserver>,
    shared: Arc<Shared>,
    poll_interval: Duration,
    query: String,
    messages: Vec<Message>,
}

impl RequestTask {
    async fn run(mut self) {
        // Step 1: session creation. Fatal on failure; no polling starts.
        let session = match self.api.start_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Session creation failed: {e}");
                self.finish(Message::assistant(GENERIC_FAILURE_NOTICE), RequestState::Failed);
                return;
            }
        };
        debug!(%session, "Routing session created");

        // Step 2: fire-and-forget trigger. Same failure path as step 1.
        if let Err(e) = self.api.start_routing(&self.query, &session).await {
            warn!("Routing trigger failed: {e}");
            self.finish(Message::assistant(GENERIC_FAILURE_NOTICE), RequestState::Failed);
            return;
        }

        *self.shared.state.lock().unwrap() = RequestState::Routing;

        // Step 3: poll immediately, then on every tick. The loop body is
        // awaited inline, so ticks never overlap and no second terminal
        // message can race in after the break.
        let mut delivered = 0usize;
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let report = match self.api.fetch_status(&session).await {
                Ok(report) => report,
                Err(e) => {
                    // Transient: retried next tick, never surfaced in chat.
                    warn!("Polling error: {e}");
                    continue;
                }
            };

            if report.logs.len() > delivered {
                let batch = report.logs[delivered..].to_vec();
                self.shared.progress_log.lock().unwrap().extend_from_slice(&batch);
                self.observer.logs_appended(&batch);
                delivered = report.logs.len();
            }

            match report.status {
                RouteStatus::Complete => {
                    let content = report
                        .result
                        .map(|r| r.output)
                        .unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string());
                    self.finish(Message::assistant(content), RequestState::Completed);
                    return;
                }
                RouteStatus::Error => {
                    let detail = report.error.unwrap_or_else(|| "unknown error".to_string());
                    self.finish(Message::assistant(format!("Error: {detail}")), RequestState::Failed);
                    return;
                }
                RouteStatus::Pending | RouteStatus::Unknown => {}
            }
        }
    }

    /// Terminal transition: exactly one assistant message, busy released.
    /// Busy is released last: an idle observation always implies the
    /// terminal transcript has already been delivered.
    fn finish(&mut self, reply: Message, state: RequestState) {
        self.messages.push(reply);
        *self.shared.state.lock().unwrap() = state;
        self.observer.transcript_replaced(&self.messages);
        self.observer.busy_changed(false);
        self.shared.busy.store(false, Ordering::Release);
    }
}
