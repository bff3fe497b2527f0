use crate::render::{format_trace_content, render_plain, truncate_chars, TraceBlock};
use crate::step::{StepNumber, StepTracker};
use serde_json::{json, Value};

// ── fixtures ────────────────────────────────────────────────────────────

fn routing_input_event() -> Value {
    json!({
        "trace": {
            "agentId": "SUPER1",
            "callerChain": [{ "agentAliasArn": "arn:supervisor" }],
            "trace": {
                "routingClassifierTrace": { "modelInvocationInput": {} }
            }
        }
    })
}

fn routing_output_event(classification: &str, input_tokens: u64, output_tokens: u64) -> Value {
    let raw_response = json!({
        "content": [{ "text": format!("<a>{classification}</a>") }]
    })
    .to_string();

    json!({
        "trace": {
            "agentId": "SUPER1",
            "callerChain": [{ "agentAliasArn": "arn:supervisor" }],
            "trace": {
                "routingClassifierTrace": {
                    "modelInvocationOutput": {
                        "metadata": {
                            "usage": { "inputTokens": input_tokens, "outputTokens": output_tokens }
                        },
                        "rawResponse": { "content": raw_response }
                    }
                }
            }
        }
    })
}

fn rationale_event(depth: usize, collaborator: Option<&str>, text: &str) -> Value {
    let chain: Vec<Value> = (0..depth).map(|i| json!({ "agentAliasArn": i })).collect();
    let mut header = json!({
        "agentId": "AGENT7",
        "callerChain": chain,
        "trace": {
            "orchestrationTrace": { "rationale": { "text": text } }
        }
    });
    if let Some(name) = collaborator {
        header["collaboratorName"] = json!(name);
    }
    json!({ "trace": header })
}

fn observation_event(observation: Value) -> Value {
    json!({
        "trace": {
            "callerChain": [],
            "trace": { "orchestrationTrace": { "observation": observation } }
        }
    })
}

fn notes(blocks: &[TraceBlock]) -> Vec<&str> {
    blocks
        .iter()
        .filter_map(|b| match b {
            TraceBlock::Note(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn headings(blocks: &[TraceBlock]) -> Vec<&str> {
    blocks
        .iter()
        .filter_map(|b| match b {
            TraceBlock::Heading(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

// ── routing classifier ──────────────────────────────────────────────────

#[test]
fn test_routing_input_announces_choice() {
    let mut tracker = StepTracker::new();
    let blocks = tracker.process(&routing_input_event());

    assert_eq!(
        notes(&blocks),
        vec!["Choosing a collaborator for this request"]
    );
    assert!(tracker.step().is_start());
}

#[test]
fn test_routing_to_new_collaborator() {
    let mut tracker = StepTracker::new();
    let blocks = tracker.process(&routing_output_event("hr-agent", 120, 15));

    assert!(notes(&blocks)
        .iter()
        .any(|n| n.contains("Routing to collaborator 'hr-agent'")));
    assert_eq!(tracker.collaborator(), Some("hr-agent"));
    assert_eq!(tracker.step().to_string(), "1");
    assert_eq!(tracker.usage().input_tokens, 120);
    assert_eq!(tracker.usage().output_tokens, 15);
}

#[test]
fn test_routing_duration_follows_input() {
    let mut tracker = StepTracker::new();
    tracker.process(&routing_input_event());
    let blocks = tracker.process(&routing_output_event("hr-agent", 1, 1));

    assert!(notes(&blocks)
        .iter()
        .any(|n| n.starts_with("Intent classifier took ")));
}

#[test]
fn test_routing_duration_absent_without_input() {
    let mut tracker = StepTracker::new();
    let blocks = tracker.process(&routing_output_event("hr-agent", 1, 1));

    assert!(!notes(&blocks)
        .iter()
        .any(|n| n.starts_with("Intent classifier took ")));
}

#[test]
fn test_routing_undecidable_keeps_step() {
    let mut tracker = StepTracker::new();
    let blocks = tracker.process(&routing_output_event("undecidable", 10, 2));

    assert!(notes(&blocks)
        .iter()
        .any(|n| n.contains("reverting to supervisor mode")));
    assert!(tracker.step().is_start());
    assert_eq!(tracker.collaborator(), None);
}

#[test]
fn test_routing_keep_previous_advances_step() {
    let mut tracker = StepTracker::new();
    tracker.process(&routing_output_event("hr-agent", 0, 0));
    let blocks = tracker.process(&routing_output_event("keep_previous_agent", 0, 0));

    assert!(notes(&blocks)
        .iter()
        .any(|n| n.contains("Continuing conversation with 'hr-agent'")));
    assert_eq!(tracker.step().to_string(), "2");
    assert_eq!(tracker.collaborator(), Some("hr-agent"));
}

#[test]
fn test_routing_same_collaborator_continues() {
    let mut tracker = StepTracker::new();
    tracker.process(&routing_output_event("hr-agent", 0, 0));
    let blocks = tracker.process(&routing_output_event("hr-agent", 0, 0));

    assert!(notes(&blocks)
        .iter()
        .any(|n| n.contains("Continuing conversation with 'hr-agent'")));
    assert_eq!(tracker.step().to_string(), "2");
}

// ── orchestration steps ─────────────────────────────────────────────────

#[test]
fn test_supervisor_rationale_numbers_whole_steps() {
    let mut tracker = StepTracker::new();

    let first = tracker.process(&rationale_event(1, None, "look up the policy"));
    let second = tracker.process(&rationale_event(0, None, "summarize"));

    assert_eq!(headings(&first), vec!["Step 1"]);
    assert_eq!(headings(&second), vec!["Step 2"]);
    assert!(first.contains(&TraceBlock::Quote("look up the policy".into())));
}

#[test]
fn test_sub_agent_rationale_numbers_sub_steps() {
    let mut tracker = StepTracker::new();
    tracker.process(&rationale_event(1, None, "delegate"));

    let sub = tracker.process(&rationale_event(2, Some("leave-desk"), "check balance"));
    assert_eq!(headings(&sub), vec!["Step 1.1 - sub-agent leave-desk"]);

    let sub2 = tracker.process(&rationale_event(2, Some("leave-desk"), "apply"));
    assert_eq!(headings(&sub2), vec!["Step 1.2 - sub-agent leave-desk"]);
}

#[test]
fn test_whole_step_after_sub_steps() {
    let mut tracker = StepTracker::new();
    tracker.process(&rationale_event(1, None, "a"));
    tracker.process(&rationale_event(2, Some("x"), "b"));
    tracker.process(&rationale_event(2, Some("x"), "c"));

    let next = tracker.process(&rationale_event(1, None, "d"));
    // Sub-steps never carry into the next whole step
    assert_eq!(headings(&next), vec!["Step 2"]);
}

#[test]
fn test_sub_agent_label_falls_back_to_agent_id() {
    let mut tracker = StepTracker::new();
    let blocks = tracker.process(&rationale_event(2, None, "working"));

    assert_eq!(headings(&blocks), vec!["Step 0.1 - sub-agent AGENT7"]);
}

// ── orchestration invocation inputs ─────────────────────────────────────

#[test]
fn test_knowledge_base_lookup_input() {
    let mut tracker = StepTracker::new();
    let event = json!({
        "trace": {
            "callerChain": [],
            "trace": {
                "orchestrationTrace": {
                    "invocationInput": {
                        "knowledgeBaseLookupInput": {
                            "knowledgeBaseId": "KB123",
                            "text": "types of leave"
                        }
                    }
                }
            }
        }
    });

    let blocks = tracker.process(&event);
    assert!(blocks.contains(&TraceBlock::SubHeading("Using knowledge base".into())));
    assert!(blocks.contains(&TraceBlock::Field("knowledge base id".into(), "KB123".into())));
    assert!(blocks.contains(&TraceBlock::Field("query".into(), "types of leave".into())));
}

#[test]
fn test_action_group_invocation_input() {
    let mut tracker = StepTracker::new();
    let event = json!({
        "trace": {
            "callerChain": [],
            "trace": {
                "orchestrationTrace": {
                    "invocationInput": {
                        "actionGroupInvocationInput": {
                            "function": "apply_leave",
                            "executionType": "LAMBDA",
                            "parameters": [
                                { "name": "emp_id", "value": "1001" },
                                { "name": "days", "value": "2" }
                            ]
                        }
                    }
                }
            }
        }
    });

    let blocks = tracker.process(&event);
    assert!(blocks.contains(&TraceBlock::SubHeading("Invoking tool - apply_leave".into())));
    assert!(blocks.contains(&TraceBlock::Field("type".into(), "LAMBDA".into())));
    assert!(blocks.contains(&TraceBlock::Field("emp_id".into(), "1001".into())));
    assert!(blocks.contains(&TraceBlock::Field("days".into(), "2".into())));
}

#[test]
fn test_code_interpreter_input() {
    let mut tracker = StepTracker::new();
    let event = json!({
        "trace": {
            "callerChain": [],
            "trace": {
                "orchestrationTrace": {
                    "invocationInput": {
                        "codeInterpreterInvocationInput": { "code": "print(1 + 1)" }
                    }
                }
            }
        }
    });

    let blocks = tracker.process(&event);
    assert!(blocks.contains(&TraceBlock::SubHeading("Code interpreter".into())));
    assert!(blocks.contains(&TraceBlock::Code("print(1 + 1)".into())));
}

// ── observations ────────────────────────────────────────────────────────

#[test]
fn test_knowledge_base_response_truncates_references() {
    let long = "x".repeat(300);
    let mut tracker = StepTracker::new();
    let blocks = tracker.process(&observation_event(json!({
        "knowledgeBaseLookupOutput": {
            "retrievedReferences": [
                { "content": { "text": long } },
                { "content": { "text": "short" } }
            ]
        }
    })));

    assert!(blocks.contains(&TraceBlock::Note("2 references".into())));
    let preview = blocks.iter().find_map(|b| match b {
        TraceBlock::Field(label, value) if label == "(1)" => Some(value),
        _ => None,
    });
    let preview = preview.expect("first reference preview");
    assert_eq!(preview.chars().count(), 201); // 200 chars + ellipsis
    assert!(preview.ends_with('\u{2026}'));
    assert!(blocks.contains(&TraceBlock::Field("(2)".into(), "short".into())));
}

#[test]
fn test_tool_response_observation() {
    let mut tracker = StepTracker::new();
    let blocks = tracker.process(&observation_event(json!({
        "actionGroupInvocationOutput": { "text": "leave applied, id 42" }
    })));

    assert!(blocks.contains(&TraceBlock::SubHeading("Tool response".into())));
    assert!(blocks.contains(&TraceBlock::Quote("leave applied, id 42".into())));
}

#[test]
fn test_code_interpreter_observation() {
    let mut tracker = StepTracker::new();
    let blocks = tracker.process(&observation_event(json!({
        "codeInterpreterInvocationOutput": {
            "executionOutput": "2",
            "executionError": "NameError: x",
            "files": ["chart.png"]
        }
    })));

    assert!(blocks.contains(&TraceBlock::Code("2".into())));
    assert!(notes(&blocks)
        .iter()
        .any(|n| n.contains("Execution error: NameError: x")));
    assert!(notes(&blocks).iter().any(|n| n.contains("chart.png")));
}

#[test]
fn test_final_response_observation() {
    let mut tracker = StepTracker::new();
    let blocks = tracker.process(&observation_event(json!({
        "finalResponse": { "text": "You have 4 casual leaves left." }
    })));

    assert!(blocks.contains(&TraceBlock::SubHeading("Agent response".into())));
    assert!(blocks.contains(&TraceBlock::Quote("You have 4 casual leaves left.".into())));
}

// ── usage accumulation ──────────────────────────────────────────────────

#[test]
fn test_usage_accumulates_across_kinds() {
    let mut tracker = StepTracker::new();
    tracker.process(&routing_output_event("hr-agent", 100, 10));

    let orch = json!({
        "trace": {
            "callerChain": [],
            "trace": {
                "orchestrationTrace": {
                    "modelInvocationOutput": {
                        "metadata": { "usage": { "inputTokens": 50, "outputTokens": 5 } }
                    }
                }
            }
        }
    });
    tracker.process(&orch);

    assert_eq!(tracker.usage().input_tokens, 150);
    assert_eq!(tracker.usage().output_tokens, 15);
}

#[test]
fn test_reset_clears_session_state() {
    let mut tracker = StepTracker::new();
    tracker.process(&routing_output_event("hr-agent", 100, 10));
    tracker.reset();

    assert!(tracker.step().is_start());
    assert_eq!(tracker.collaborator(), None);
    assert!(tracker.usage().is_empty());
}

// ── fallbacks and formatting ────────────────────────────────────────────

#[test]
fn test_unknown_event_falls_back_to_raw_block() {
    let mut tracker = StepTracker::new();
    let raw = json!({ "preProcessingTrace": { "modelInvocationInput": {} } });

    let blocks = tracker.process(&raw);
    assert_eq!(blocks.len(), 1);
    match &blocks[0] {
        TraceBlock::Code(text) => assert!(text.contains("preProcessingTrace")),
        other => panic!("expected raw block, got {other:?}"),
    }
    assert!(tracker.step().is_start());
}

#[test]
fn test_plain_string_event_kept_verbatim() {
    let mut tracker = StepTracker::new();
    let blocks = tracker.process(&Value::String("free-form trace".into()));

    assert_eq!(blocks, vec![TraceBlock::Code("free-form trace".into())]);
}

#[test]
fn test_format_trace_content_pretty_prints_json_strings() {
    let formatted = format_trace_content(&Value::String("{\"a\":1}".into()));
    assert_eq!(formatted, "{\n  \"a\": 1\n}");
}

#[test]
fn test_format_trace_content_passes_text_through() {
    let formatted = format_trace_content(&Value::String("{not json".into()));
    assert_eq!(formatted, "{not json");

    let formatted = format_trace_content(&Value::String("plain words".into()));
    assert_eq!(formatted, "plain words");
}

#[test]
fn test_format_trace_content_objects() {
    let formatted = format_trace_content(&json!({ "b": [1, 2] }));
    assert!(formatted.contains("\"b\": [\n"));
}

#[test]
fn test_truncate_chars_multibyte_safe() {
    assert_eq!(truncate_chars("héllo", 10), "héllo");
    let out = truncate_chars("日本語のテキスト", 3);
    assert_eq!(out, "日本語\u{2026}");
}

#[test]
fn test_step_number_display() {
    let mut step = StepNumber::default();
    assert!(step.is_start());
    step.advance();
    assert_eq!(step.to_string(), "1");
    step.advance_sub();
    step.advance_sub();
    assert_eq!(step.to_string(), "1.2");
    step.advance();
    assert_eq!(step.to_string(), "2");
}

#[test]
fn test_render_plain_layout() {
    let blocks = vec![
        TraceBlock::Heading("Step 1".into()),
        TraceBlock::Field("query".into(), "leave types".into()),
        TraceBlock::Code("line1\nline2".into()),
    ];

    let text = render_plain(&blocks);
    assert_eq!(text, "== Step 1 ==\nquery: leave types\n  line1\n  line2\n");
}
