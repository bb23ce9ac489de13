pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ChatError;

/// Default poll cadence against the status endpoint.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Where the routing service lives and how often to poll it.
/// Injected into the transports so tests can point at a local stub.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub base_url: String,
    pub poll_interval: Duration,
}

impl RouterConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), poll_interval: DEFAULT_POLL_INTERVAL }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Reads `HYRA_BASE_URL` / `HYRA_POLL_INTERVAL_MS`, falling back to the
    /// local development defaults.
    pub fn from_env() -> Self {
        let base_url = std::env::var("HYRA_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let poll_interval = std::env::var("HYRA_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        Self { base_url, poll_interval }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Server-issued token scoping one routing request. Never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: SessionId,
}

#[derive(Debug, Serialize)]
pub struct StartRoutingRequest<'a> {
    pub query: &'a str,
    pub session_id: &'a SessionId,
}

/// Routing status as reported by the service. Statuses this client does not
/// know about are treated like `pending`: keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    Pending,
    Complete,
    Error,
    #[serde(other)]
    Unknown,
}

impl RouteStatus {
    /// `complete` or `error`; any status after which polling must stop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RouteStatus::Complete | RouteStatus::Error)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteResult {
    pub output: String,
}

/// One snapshot of a session's progress. `logs` always contains the full
/// history so far; the controller slices off what it has already delivered.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub logs: Vec<String>,
    pub status: RouteStatus,
    #[serde(default)]
    pub result: Option<RouteResult>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The three calls of the session-scoped polling flow.
#[async_trait]
pub trait RoutingApi: Send + Sync {
    /// Creates a fresh session. No request body.
    async fn start_session(&self) -> Result<SessionId, ChatError>;

    /// Kicks off routing for `query` under `session`. The response body is
    /// ignored; only transport failure matters.
    async fn start_routing(&self, query: &str, session: &SessionId) -> Result<(), ChatError>;

    /// Fetches the session's accumulated logs and current status.
    async fn fetch_status(&self, session: &SessionId) -> Result<StatusReport, ChatError>;
}

/// The single-call flow: one query in, one answer out, no sessions.
#[async_trait]
pub trait DirectApi: Send + Sync {
    async fn ask(&self, query: &str) -> Result<String, ChatError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_report_parses_pending_without_result() {
        let report: StatusReport =
            serde_json::from_str(r#"{"logs":["a","b"],"status":"pending"}"#).unwrap();
        assert_eq!(report.logs, vec!["a", "b"]);
        assert_eq!(report.status, RouteStatus::Pending);
        assert!(report.result.is_none());
        assert!(report.error.is_none());
    }

    #[test]
    fn status_report_parses_complete_with_result() {
        let report: StatusReport = serde_json::from_str(
            r#"{"logs":[],"status":"complete","result":{"output":"42"}}"#,
        )
        .unwrap();
        assert!(report.status.is_terminal());
        assert_eq!(report.result.unwrap().output, "42");
    }

    #[test]
    fn unknown_status_is_not_terminal() {
        let report: StatusReport =
            serde_json::from_str(r#"{"logs":[],"status":"warming_up"}"#).unwrap();
        assert_eq!(report.status, RouteStatus::Unknown);
        assert!(!report.status.is_terminal());
    }

    #[test]
    fn missing_logs_defaults_to_empty() {
        let report: StatusReport = serde_json::from_str(r#"{"status":"error","error":"boom"}"#)
            .unwrap();
        assert!(report.logs.is_empty());
        assert_eq!(report.error.as_deref(), Some("boom"));
    }
}
