//! Wire types for the agent backend contract
//!
//! The backend is invoked as an opaque request/response handler. The shapes
//! here are dictated by that service, not designed by this crate.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Default backend endpoint (local handler emulator)
pub const DEFAULT_ENDPOINT: &str = "http://localhost:9000/invoke";

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default session-id prefix
pub const DEFAULT_SESSION_PREFIX: &str = "confab";

/// Question text sent when tearing a session down. The backend only looks at
/// the `endSession` flag, but the field is mandatory on the wire.
pub const END_SESSION_QUESTION: &str = "placeholder to end session";

// ============================================================================
// Configuration
// ============================================================================

/// Backend client configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Handler endpoint URL
    pub endpoint: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Prefix for generated session ids
    pub session_prefix: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_prefix: DEFAULT_SESSION_PREFIX.to_string(),
        }
    }
}

impl BackendConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handler endpoint URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the session-id prefix
    pub fn with_session_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.session_prefix = prefix.into();
        self
    }

    /// Apply `CONFAB_ENDPOINT` / `CONFAB_TIMEOUT_SECS` environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var("CONFAB_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint;
            }
        }
        if let Ok(secs) = std::env::var("CONFAB_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                self.timeout = Duration::from_secs(secs);
            }
        }
        self
    }

    /// Create a configuration from environment variables alone
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }
}

// ============================================================================
// Request
// ============================================================================

/// One question submitted to the backend handler
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    /// Conversation session id; the backend keys its memory on this
    pub session_id: String,
    /// The user's question text
    pub question: String,
    /// When set, the backend discards the session after this request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_session: Option<bool>,
}

impl AgentRequest {
    /// Build a question request
    pub fn new(session_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            question: question.into(),
            end_session: None,
        }
    }

    /// Build a session-teardown request
    pub fn end_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            question: END_SESSION_QUESTION.to_string(),
            end_session: Some(true),
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// Lambda-style response envelope. `body` is either a JSON string holding
/// the payload or the payload inlined as an object.
#[derive(Debug, Deserialize)]
pub struct InvokeEnvelope {
    /// The wrapped payload
    #[serde(default)]
    pub body: Option<Value>,
}

/// The backend's answer payload
#[derive(Debug, Clone, Deserialize)]
pub struct AgentReply {
    /// The agent's final answer. Usually text; some action groups return a
    /// JSON array that renders as a table.
    pub response: Value,
    /// Zero or more execution trace events: an array, a single object, or a
    /// raw string the backend did not bother to structure.
    #[serde(default)]
    pub trace_data: Option<Value>,
}

impl AgentReply {
    /// The answer as display text
    pub fn answer(&self) -> String {
        match &self.response {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Normalize `trace_data` into an ordered list of raw trace values.
    ///
    /// Arrays flatten to their elements, a lone object becomes a single
    /// entry, and strings are parsed when they hold JSON. A string that does
    /// not parse is kept verbatim so it still shows up in the trace panel.
    pub fn traces(&self) -> Vec<Value> {
        match &self.trace_data {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(Value::String(s)) => {
                if s.trim().is_empty() {
                    return Vec::new();
                }
                match serde_json::from_str::<Value>(s) {
                    Ok(Value::Array(items)) => items,
                    Ok(value) => vec![value],
                    Err(_) => vec![Value::String(s.clone())],
                }
            }
            Some(other) => vec![other.clone()],
        }
    }
}
