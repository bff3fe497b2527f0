//! HTTP client for the agent backend handler

use crate::error::{Error, Result};
use crate::types::{AgentReply, AgentRequest, BackendConfig, InvokeEnvelope};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// Client for the opaque backend request/response handler
pub struct BackendClient {
    client: Client,
    config: BackendConfig,
}

impl BackendClient {
    /// Create a new backend client
    pub fn new(config: BackendConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(Error::InvalidConfig("endpoint must not be empty".into()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(BackendConfig::default())
    }

    /// The active configuration
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Submit one request and return the parsed reply.
    pub async fn invoke(&self, request: &AgentRequest) -> Result<AgentReply> {
        debug!(session = %request.session_id, "Invoking agent backend");

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    Error::Network(format!(
                        "Failed to connect to backend at {}. Is the handler reachable?",
                        self.config.endpoint
                    ))
                } else if e.is_timeout() {
                    Error::Timeout(self.config.timeout.as_millis() as u64)
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Api(format!(
                "status {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        parse_reply(&body)
    }

    /// Tear the backend session down. The reply body is ignored; the
    /// backend discards its side of the conversation either way.
    pub async fn end_session(&self, session_id: &str) -> Result<()> {
        let request = AgentRequest::end_session(session_id);
        debug!(session = %session_id, "Ending agent backend session");
        self.invoke(&request).await.map(|_| ())
    }
}

/// Unwrap the `body` envelope and deserialize the answer payload.
///
/// Accepts the payload inlined at the top level as well, since handler
/// emulators tend to skip the Lambda proxy wrapping.
pub fn parse_reply(body: &str) -> Result<AgentReply> {
    if body.trim().is_empty() {
        return Err(Error::EmptyResponse);
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| Error::InvalidResponse(e.to_string()))?;

    let payload = if value.get("body").is_some() {
        let envelope: InvokeEnvelope =
            serde_json::from_value(value).map_err(|e| Error::InvalidResponse(e.to_string()))?;
        match envelope.body {
            None | Some(Value::Null) => return Err(Error::EmptyResponse),
            Some(Value::String(s)) => {
                if s.trim().is_empty() {
                    return Err(Error::EmptyResponse);
                }
                serde_json::from_str(&s).map_err(|e| Error::InvalidResponse(e.to_string()))?
            }
            Some(inline) => inline,
        }
    } else {
        value
    };

    serde_json::from_value(payload).map_err(|e| Error::InvalidResponse(e.to_string()))
}
