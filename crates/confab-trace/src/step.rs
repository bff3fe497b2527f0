//! Step - trace walking, step numbering, and routing state
//!
//! One [`StepTracker`] lives per chat session. Every incoming trace record
//! runs through [`StepTracker::process`], which returns the display blocks
//! for that record and updates step/routing/usage state on the way.

use crate::event::{
    ModelInvocationOutput, Observation, OrchestrationTrace, RoutingClassifierTrace, TokenUsage,
    TraceEvent, TraceHeader,
};
use crate::render::{format_duration, format_trace_content, truncate_chars, TraceBlock};
use serde_json::Value;
use std::fmt;
use std::time::Instant;

/// Classifier verdict meaning "no collaborator matched"
const UNDECIDABLE: &str = "undecidable";

/// Classifier verdict meaning "stay with the previous collaborator"
const KEEP_PREVIOUS: &str = "keep_previous_agent";

/// Knowledge-base reference previews are cut to this many characters
const REFERENCE_PREVIEW_CHARS: usize = 200;

/// Display index of one orchestration step.
///
/// Supervisor steps count in whole numbers; sub-agent steps add a fractional
/// digit below the current whole step ("3.2"). Kept as two integers so
/// repeated sub-steps cannot drift the way float arithmetic would.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepNumber {
    whole: u32,
    sub: u32,
}

impl StepNumber {
    /// Advance to the next whole step, dropping any sub-step
    pub fn advance(&mut self) {
        self.whole += 1;
        self.sub = 0;
    }

    /// Advance the sub-step below the current whole step
    pub fn advance_sub(&mut self) {
        self.sub += 1;
    }

    /// Whether any step has been numbered yet
    pub fn is_start(&self) -> bool {
        self.whole == 0 && self.sub == 0
    }
}

impl fmt::Display for StepNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sub == 0 {
            write!(f, "{}", self.whole)
        } else {
            write!(f, "{}.{}", self.whole, self.sub)
        }
    }
}

/// Per-session trace state: step numbering, active collaborator, routing
/// timer, and cumulative token usage.
#[derive(Debug, Default)]
pub struct StepTracker {
    step: StepNumber,
    collaborator: Option<String>,
    routing_started: Option<Instant>,
    usage: TokenUsage,
}

impl StepTracker {
    /// Create a fresh tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step number
    pub fn step(&self) -> StepNumber {
        self.step
    }

    /// The collaborator currently handling requests, if routing picked one
    pub fn collaborator(&self) -> Option<&str> {
        self.collaborator.as_deref()
    }

    /// Token usage accumulated across all processed records
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    /// Drop all session state (used when a session ends)
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Process one raw trace record into display blocks.
    ///
    /// Total: records that are not recognizable trace events come back as a
    /// single raw block holding the formatted payload.
    pub fn process(&mut self, raw: &Value) -> Vec<TraceBlock> {
        let Some(header) = TraceEvent::from_value(raw).and_then(|event| event.trace) else {
            tracing::debug!("Unrecognized trace record, rendering raw");
            return vec![TraceBlock::Code(format_trace_content(raw))];
        };

        let mut blocks = Vec::new();
        if let Some(routing) = &header.trace.routing_classifier_trace {
            self.process_routing(routing, &mut blocks);
        }
        if let Some(orchestration) = &header.trace.orchestration_trace {
            self.process_orchestration(&header, orchestration, &mut blocks);
        }

        if blocks.is_empty() {
            // Known kind but nothing displayable (e.g. bare usage metadata)
            blocks.push(TraceBlock::Code(format_trace_content(raw)));
        }
        blocks
    }

    // ── routing classifier ──────────────────────────────────────────────

    fn process_routing(&mut self, routing: &RoutingClassifierTrace, blocks: &mut Vec<TraceBlock>) {
        if routing.model_invocation_input.is_some() {
            self.routing_started = Some(Instant::now());
            blocks.push(TraceBlock::Note(
                "Choosing a collaborator for this request".into(),
            ));
        }

        if let Some(output) = &routing.model_invocation_output {
            self.absorb_usage(output);
            self.process_classification(output, blocks);

            if let Some(started) = self.routing_started.take() {
                blocks.push(TraceBlock::Note(format!(
                    "Intent classifier took {}",
                    format_duration(started.elapsed())
                )));
            }
        }
    }

    fn process_classification(
        &mut self,
        output: &ModelInvocationOutput,
        blocks: &mut Vec<TraceBlock>,
    ) {
        let Some(classification) = output.classification() else {
            return;
        };

        if classification == UNDECIDABLE {
            blocks.push(TraceBlock::Note(
                "No matching collaborator; reverting to supervisor mode for this request".into(),
            ));
        } else if classification == KEEP_PREVIOUS
            || self.collaborator.as_deref() == Some(classification.as_str())
        {
            self.step.advance();
            let name = self.collaborator.as_deref().unwrap_or("previous collaborator");
            blocks.push(TraceBlock::Note(format!(
                "Continuing conversation with '{name}'"
            )));
        } else {
            self.step.advance();
            blocks.push(TraceBlock::Note(format!(
                "Routing to collaborator '{classification}'"
            )));
            self.collaborator = Some(classification);
        }
    }

    // ── orchestration ───────────────────────────────────────────────────

    fn process_orchestration(
        &mut self,
        header: &TraceHeader,
        orchestration: &OrchestrationTrace,
        blocks: &mut Vec<TraceBlock>,
    ) {
        if let Some(input) = &orchestration.invocation_input {
            if let Some(kb) = &input.knowledge_base_lookup_input {
                blocks.push(TraceBlock::SubHeading("Using knowledge base".into()));
                blocks.push(TraceBlock::Field(
                    "knowledge base id".into(),
                    kb.knowledge_base_id.clone(),
                ));
                blocks.push(TraceBlock::Field("query".into(), kb.text.clone()));
            }

            if let Some(action) = &input.action_group_invocation_input {
                blocks.push(TraceBlock::SubHeading(format!(
                    "Invoking tool - {}",
                    action.function
                )));
                blocks.push(TraceBlock::Field("function".into(), action.function.clone()));
                blocks.push(TraceBlock::Field(
                    "type".into(),
                    action.execution_type.clone(),
                ));
                for param in &action.parameters {
                    blocks.push(TraceBlock::Field(param.name.clone(), param.value.clone()));
                }
            }

            if let Some(code) = &input.code_interpreter_invocation_input {
                blocks.push(TraceBlock::SubHeading("Code interpreter".into()));
                blocks.push(TraceBlock::Code(code.code.clone()));
            }
        }

        if let Some(output) = &orchestration.model_invocation_output {
            self.absorb_usage(output);
        }

        if let Some(rationale) = &orchestration.rationale {
            if header.is_sub_agent() {
                self.step.advance_sub();
                blocks.push(TraceBlock::Heading(format!(
                    "Step {} - sub-agent {}",
                    self.step,
                    header.agent_label()
                )));
            } else {
                self.step.advance();
                blocks.push(TraceBlock::Heading(format!("Step {}", self.step)));
            }
            if !rationale.text.is_empty() {
                blocks.push(TraceBlock::Quote(rationale.text.clone()));
            }
        }

        if let Some(observation) = &orchestration.observation {
            self.process_observation(observation, blocks);
        }
    }

    fn process_observation(&mut self, observation: &Observation, blocks: &mut Vec<TraceBlock>) {
        if let Some(kb) = &observation.knowledge_base_lookup_output {
            blocks.push(TraceBlock::SubHeading("Knowledge base response".into()));
            blocks.push(TraceBlock::Note(format!(
                "{} references",
                kb.retrieved_references.len()
            )));
            for (i, reference) in kb.retrieved_references.iter().enumerate() {
                blocks.push(TraceBlock::Field(
                    format!("({})", i + 1),
                    truncate_chars(&reference.content.text, REFERENCE_PREVIEW_CHARS),
                ));
            }
        }

        if let Some(action) = &observation.action_group_invocation_output {
            blocks.push(TraceBlock::SubHeading("Tool response".into()));
            blocks.push(TraceBlock::Quote(action.text.clone()));
        }

        if let Some(code) = &observation.code_interpreter_invocation_output {
            blocks.push(TraceBlock::SubHeading("Code interpreter result".into()));
            if let Some(output) = &code.execution_output {
                blocks.push(TraceBlock::Code(output.clone()));
            }
            if let Some(error) = &code.execution_error {
                blocks.push(TraceBlock::Note(format!("Execution error: {error}")));
            }
            if let Some(files) = &code.files {
                blocks.push(TraceBlock::Note(format!(
                    "Files generated: {}",
                    format_trace_content(files)
                )));
            }
        }

        if let Some(final_response) = &observation.final_response {
            blocks.push(TraceBlock::SubHeading("Agent response".into()));
            blocks.push(TraceBlock::Quote(final_response.text.clone()));
        }
    }

    fn absorb_usage(&mut self, output: &ModelInvocationOutput) {
        let usage = output.usage();
        if !usage.is_empty() {
            self.usage.accumulate(usage);
        }
    }
}
