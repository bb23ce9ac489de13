use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ChatError;
use crate::transport::{
    DirectApi, RouterConfig, RoutingApi, SessionId, StartRoutingRequest, StartSessionResponse,
    StatusReport,
};

/// HTTP client for the routing service. Implements both submission flows;
/// which one is used is decided at the service layer.
#[derive(Debug, Clone)]
pub struct HttpRouterClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRouterClient {
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl RoutingApi for HttpRouterClient {
    async fn start_session(&self) -> Result<SessionId, ChatError> {
        let resp = self
            .http
            .post(self.url("/api/start_session"))
            .send()
            .await
            .map_err(|e| ChatError::session(format!("Network error: {e}")))?
            .error_for_status()
            .map_err(|e| ChatError::session(format!("Server error: {e}")))?;

        let body: StartSessionResponse = resp
            .json()
            .await
            .map_err(|e| ChatError::session(format!("Parse error: {e}")))?;
        debug!(session_id = %body.session_id, "Routing session created");
        Ok(body.session_id)
    }

    async fn start_routing(&self, query: &str, session: &SessionId) -> Result<(), ChatError> {
        // Response body is unused; only the call itself can fail the request.
        self.http
            .post(self.url("/api/start_routing"))
            .json(&StartRoutingRequest { query, session_id: session })
            .send()
            .await
            .map_err(|e| ChatError::trigger(format!("Network error: {e}")))?
            .error_for_status()
            .map_err(|e| ChatError::trigger(format!("Server error: {e}")))?;
        Ok(())
    }

    async fn fetch_status(&self, session: &SessionId) -> Result<StatusReport, ChatError> {
        let resp = self
            .http
            .get(self.url(&format!("/api/get_logs/{session}")))
            .send()
            .await
            .map_err(|e| ChatError::poll(format!("Network error: {e}")))?
            .error_for_status()
            .map_err(|e| ChatError::poll(format!("Server error: {e}")))?;

        resp.json()
            .await
            .map_err(|e| ChatError::poll(format!("Parse error: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    query: &'a str,
}

/// Ollama-shaped response returned by the direct endpoint.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    message: GeneratedMessage,
}

#[derive(Debug, Deserialize)]
struct GeneratedMessage {
    content: String,
}

#[async_trait]
impl DirectApi for HttpRouterClient {
    async fn ask(&self, query: &str) -> Result<String, ChatError> {
        // The service spells this path "generate_anwser"; the typo is part of
        // the wire contract.
        let resp = self
            .http
            .post(self.url("/api/generate_anwser"))
            .json(&GenerateRequest { query })
            .send()
            .await
            .map_err(|e| ChatError::inference(format!("Network error: {e}")))?
            .error_for_status()
            .map_err(|e| ChatError::inference(format!("Server error: {e}")))?;

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ChatError::inference(format!("Parse error: {e}")))?;
        Ok(body.message.content)
    }
}
