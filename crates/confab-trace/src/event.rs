//! Event - serde model of the backend trace schema
//!
//! The schema is fixed and externally defined; every field is optional on
//! the wire, so the whole tree deserializes with defaults and unknown
//! fields are ignored. Field names are camelCase as emitted by the backend.

use serde::Deserialize;
use serde_json::Value;

/// One backend trace record.
///
/// The wire nests twice: the outer `trace` carries agent identity and the
/// caller chain, the inner one the actual step payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TraceEvent {
    /// Agent identity, caller chain, and the step payload
    pub trace: Option<TraceHeader>,
}

impl TraceEvent {
    /// Parse a raw JSON value. `None` when the value is not a trace record.
    pub fn from_value(value: &Value) -> Option<Self> {
        let event: TraceEvent = serde_json::from_value(value.clone()).ok()?;
        match &event.trace {
            Some(header) if header.trace.is_known() => Some(event),
            _ => None,
        }
    }
}

/// Agent identity and routing context around a step payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TraceHeader {
    /// Id of the agent that produced this record
    pub agent_id: Option<String>,
    /// Display name of the collaborator, when the backend includes one
    pub collaborator_name: Option<String>,
    /// Invocation chain; more than one entry means a sub-agent is running
    pub caller_chain: Vec<Value>,
    /// The step payload
    pub trace: TracePart,
}

impl TraceHeader {
    /// Best display name for the agent behind this record
    pub fn agent_label(&self) -> &str {
        self.collaborator_name
            .as_deref()
            .or(self.agent_id.as_deref())
            .unwrap_or("unknown agent")
    }

    /// Whether this record was produced below the supervisor
    pub fn is_sub_agent(&self) -> bool {
        self.caller_chain.len() > 1
    }
}

/// The step payload: exactly one of the known trace kinds
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TracePart {
    /// Intent-classification step choosing a collaborator
    pub routing_classifier_trace: Option<RoutingClassifierTrace>,
    /// Supervisor/collaborator orchestration step
    pub orchestration_trace: Option<OrchestrationTrace>,
}

impl TracePart {
    /// Whether the payload holds a kind this crate understands
    pub fn is_known(&self) -> bool {
        self.routing_classifier_trace.is_some() || self.orchestration_trace.is_some()
    }
}

// ============================================================================
// Routing classifier
// ============================================================================

/// Routing classifier trace: the model run that picks a collaborator
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutingClassifierTrace {
    /// Present when classification starts; contents are not displayed
    pub model_invocation_input: Option<Value>,
    /// Present when classification finishes
    pub model_invocation_output: Option<ModelInvocationOutput>,
}

/// Output of a model invocation, shared by routing and orchestration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelInvocationOutput {
    /// Usage metadata
    pub metadata: Option<InvocationMetadata>,
    /// The raw model response (routing only)
    pub raw_response: Option<RawResponse>,
}

/// Metadata attached to a model invocation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationMetadata {
    /// Token usage for this invocation
    pub usage: Option<TokenUsage>,
}

/// Token usage counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt
    pub input_tokens: u64,
    /// Tokens produced by the model
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Add another invocation's usage to this counter
    pub fn accumulate(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    /// Whether any tokens have been counted
    pub fn is_empty(&self) -> bool {
        self.input_tokens == 0 && self.output_tokens == 0
    }
}

/// Raw model response; `content` is a JSON string holding the actual message
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawResponse {
    /// Stringified response document
    pub content: Option<String>,
}

impl ModelInvocationOutput {
    /// Usage for this invocation, zero when absent
    pub fn usage(&self) -> TokenUsage {
        self.metadata
            .as_ref()
            .and_then(|m| m.usage)
            .unwrap_or_default()
    }

    /// Decode the classifier's verdict out of the raw response.
    ///
    /// The raw response `content` is itself JSON with the classification in
    /// `content[0].text`, wrapped in `<a>…</a>` tags.
    pub fn classification(&self) -> Option<String> {
        let raw = self.raw_response.as_ref()?.content.as_deref()?;
        let doc: RawResponseDocument = serde_json::from_str(raw).ok()?;
        let text = &doc.content.first()?.text;
        Some(text.replace("<a>", "").replace("</a>", "").trim().to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawResponseDocument {
    content: Vec<RawResponseItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawResponseItem {
    text: String,
}

// ============================================================================
// Orchestration
// ============================================================================

/// Orchestration trace: one slice of the agent's reasoning loop
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestrationTrace {
    /// A tool/knowledge-base/code invocation being issued
    pub invocation_input: Option<InvocationInput>,
    /// Model output carrying usage metadata
    pub model_invocation_output: Option<ModelInvocationOutput>,
    /// The agent's reasoning for the current step
    pub rationale: Option<Rationale>,
    /// The result the agent observed
    pub observation: Option<Observation>,
}

/// The agent's reasoning text
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rationale {
    /// Free-form reasoning
    pub text: String,
}

/// An invocation the agent is issuing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationInput {
    /// Knowledge-base query
    pub knowledge_base_lookup_input: Option<KnowledgeBaseLookupInput>,
    /// Action-group (tool) call
    pub action_group_invocation_input: Option<ActionGroupInvocationInput>,
    /// Code-interpreter execution
    pub code_interpreter_invocation_input: Option<CodeInterpreterInvocationInput>,
}

/// Knowledge-base query parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KnowledgeBaseLookupInput {
    /// Target knowledge base
    pub knowledge_base_id: String,
    /// Query text
    pub text: String,
}

/// Action-group (tool) call parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionGroupInvocationInput {
    /// Function being invoked
    pub function: String,
    /// Execution type (e.g. LAMBDA)
    pub execution_type: String,
    /// Named arguments
    pub parameters: Vec<InvocationParameter>,
}

/// One named argument of an action-group call
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationParameter {
    /// Parameter name
    pub name: String,
    /// Parameter value, stringified by the backend
    pub value: String,
}

/// Code handed to the code interpreter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeInterpreterInvocationInput {
    /// Generated source code
    pub code: String,
}

/// The result the agent observed after an invocation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Observation {
    /// Knowledge-base references
    pub knowledge_base_lookup_output: Option<KnowledgeBaseLookupOutput>,
    /// Tool response text
    pub action_group_invocation_output: Option<ActionGroupInvocationOutput>,
    /// Code-interpreter result
    pub code_interpreter_invocation_output: Option<CodeInterpreterInvocationOutput>,
    /// The agent's final answer for this request
    pub final_response: Option<FinalResponse>,
}

/// References retrieved from a knowledge base
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KnowledgeBaseLookupOutput {
    /// Retrieved passages
    pub retrieved_references: Vec<RetrievedReference>,
}

/// One retrieved knowledge-base passage
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievedReference {
    /// Passage content
    pub content: ReferenceContent,
}

/// Content of a retrieved passage
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceContent {
    /// Passage text
    pub text: String,
}

/// Tool response payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionGroupInvocationOutput {
    /// Response text
    pub text: String,
}

/// Code-interpreter result payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeInterpreterInvocationOutput {
    /// Captured stdout of the execution
    pub execution_output: Option<String>,
    /// Error text when execution failed
    pub execution_error: Option<String>,
    /// Files the execution produced
    pub files: Option<Value>,
}

/// The agent's final answer
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinalResponse {
    /// Answer text
    pub text: String,
}
