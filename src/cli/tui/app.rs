//! TUI application state management

use chrono::Local;
use confab_backend::{AgentReply, AgentRequest, BackendClient};
use confab_trace::{StepTracker, TraceBlock};
use ratatui::style::Style;
use ratatui::widgets::ScrollbarState;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tui_textarea::TextArea;
use unicode_width::UnicodeWidthStr;

use super::command::CommandRegistry;
use crate::config::ExamplePrompt;

/// A single chat message displayed in the TUI.
pub struct ChatMessage {
    pub role: Role,
    pub sender: String,
    pub content: String,
    /// Render verbatim instead of through the markdown renderer
    /// (tabular answers)
    pub preformatted: bool,
    pub timestamp: chrono::DateTime<Local>,
}

/// Who sent the message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One trace record shown in the side panel.
pub struct TraceEntry {
    /// The raw backend payload (kept for duplicate suppression)
    pub raw: Value,
    /// Display blocks produced by the step tracker
    pub blocks: Vec<TraceBlock>,
    pub received_at: chrono::DateTime<Local>,
}

/// Result of a background backend invocation.
pub enum WorkerEvent {
    Reply(Box<AgentReply>),
    Failed(String),
}

/// Maximum number of input history entries retained.
const MAX_HISTORY: usize = 50;

/// Shown in place of an answer when the backend call failed. Best-effort:
/// no retries, no escalation.
pub const ERROR_PLACEHOLDER: &str =
    "Apologies, but an error occurred. Please retry the request.";

/// Display name for the answering side of the conversation.
const AGENT_SENDER: &str = "agent";

/// Main application state.
pub struct App {
    pub messages: Vec<ChatMessage>,
    /// Trace entries, newest first.
    pub traces: Vec<TraceEntry>,
    /// Step numbering, routing state, and token usage for this session.
    pub tracker: StepTracker,
    pub textarea: TextArea<'static>,
    pub session_id: String,
    pub scroll_offset: usize,
    pub trace_scroll: usize,
    pub scrollbar_state: ScrollbarState,
    pub is_loading: bool,
    pub should_quit: bool,
    pub loading_tick: usize,
    /// Whether the trace panel is visible (toggled with F1).
    pub show_traces: bool,
    /// Whether mouse capture is active (toggled with F2).
    pub mouse_captured: bool,
    /// Slash-command completions for the current input.
    pub suggestions: Vec<&'static str>,
    /// Example prompts from configuration, listed by `/prompts`.
    pub prompts: Vec<ExamplePrompt>,
    /// Previous input history for up/down navigation.
    input_history: Vec<String>,
    /// Current position in input history (None = new input).
    history_index: Option<usize>,
    client: Arc<BackendClient>,
    /// Sender side lives in App so `submit_message` can clone it into
    /// spawned tasks.
    response_tx: mpsc::UnboundedSender<WorkerEvent>,
    /// Receiver side polled each frame by the event loop.
    pub response_rx: mpsc::UnboundedReceiver<WorkerEvent>,
}

impl App {
    pub fn new(client: BackendClient, prompts: Vec<ExamplePrompt>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let session_id = format!(
            "{}-{}",
            client.config().session_prefix,
            uuid::Uuid::new_v4()
        );

        let mut app = Self {
            messages: Vec::new(),
            traces: Vec::new(),
            tracker: StepTracker::new(),
            textarea: new_textarea(),
            session_id,
            scroll_offset: 0,
            trace_scroll: 0,
            scrollbar_state: ScrollbarState::default(),
            is_loading: false,
            should_quit: false,
            loading_tick: 0,
            show_traces: true,
            mouse_captured: true,
            suggestions: Vec::new(),
            prompts,
            input_history: Vec::new(),
            history_index: None,
            client: Arc::new(client),
            response_tx: tx,
            response_rx: rx,
        };

        app.push_system(
            "Welcome to Confab. Type /help for commands, /prompts for example questions, \
             F1 to toggle the trace panel."
                .to_string(),
        );
        app
    }

    /// The backend endpoint this session talks to.
    pub fn endpoint(&self) -> &str {
        &self.client.config().endpoint
    }

    // ── helpers ──────────────────────────────────────────────────────────

    pub fn push_system(&mut self, content: String) {
        self.messages.push(ChatMessage {
            role: Role::System,
            sender: "system".into(),
            content,
            preformatted: false,
            timestamp: Local::now(),
        });
    }

    fn push_user(&mut self, content: String) {
        self.messages.push(ChatMessage {
            role: Role::User,
            sender: "You".into(),
            content,
            preformatted: false,
            timestamp: Local::now(),
        });
    }

    fn push_assistant(&mut self, content: String, preformatted: bool) {
        self.messages.push(ChatMessage {
            role: Role::Assistant,
            sender: AGENT_SENDER.into(),
            content,
            preformatted,
            timestamp: Local::now(),
        });
    }

    /// Scroll to the bottom of the chat history.
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Toggle trace panel visibility (F1).
    pub fn toggle_traces(&mut self) {
        self.show_traces = !self.show_traces;
    }

    // ── input handling ──────────────────────────────────────────────────

    /// Returns true if the textarea is empty (single empty line).
    pub fn is_input_empty(&self) -> bool {
        self.textarea.lines().len() == 1 && self.textarea.lines()[0].is_empty()
    }

    /// Returns true if there are previous inputs in history.
    pub fn has_history(&self) -> bool {
        !self.input_history.is_empty()
    }

    /// Navigate to the previous entry in input history.
    pub fn history_up(&mut self) {
        if self.input_history.is_empty() {
            return;
        }
        let idx = match self.history_index {
            None => self.input_history.len() - 1,
            Some(0) => return,
            Some(i) => i - 1,
        };
        self.history_index = Some(idx);
        self.set_input(self.input_history[idx].clone());
    }

    /// Navigate to the next entry in input history, or clear if at the end.
    pub fn history_down(&mut self) {
        match self.history_index {
            None => {}
            Some(i) if i >= self.input_history.len() - 1 => {
                self.history_index = None;
                self.textarea = new_textarea();
            }
            Some(i) => {
                self.history_index = Some(i + 1);
                self.set_input(self.input_history[i + 1].clone());
            }
        }
    }

    /// Replace the input line with the given text, cursor at the end.
    pub fn set_input(&mut self, text: String) {
        self.textarea = TextArea::new(vec![text]);
        self.textarea.set_cursor_line_style(Style::default());
        self.textarea.move_cursor(tui_textarea::CursorMove::End);
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn trace_scroll_up(&mut self) {
        self.trace_scroll = self.trace_scroll.saturating_sub(1);
    }

    pub fn trace_scroll_down(&mut self) {
        self.trace_scroll = self.trace_scroll.saturating_add(1);
    }

    /// Refresh slash-command suggestions for the current input.
    pub fn update_suggestions(&mut self) {
        if self.textarea.lines().len() == 1 {
            let input = self.textarea.lines()[0].trim().to_string();
            self.suggestions = CommandRegistry::new().get_suggestions(&input);
        } else {
            self.suggestions.clear();
        }
    }

    // ── submit ──────────────────────────────────────────────────────────

    /// Process typed input: either a `/command` or a question.
    pub fn submit(&mut self) {
        let text = self.textarea.lines().join("\n").trim().to_string();
        if text.is_empty() {
            return;
        }

        // Store in history (cap at MAX_HISTORY)
        self.input_history.push(text.clone());
        if self.input_history.len() > MAX_HISTORY {
            self.input_history.remove(0);
        }
        self.history_index = None;

        // Reset textarea
        self.textarea = new_textarea();
        self.suggestions.clear();

        if text.starts_with('/') {
            if let Err(e) = CommandRegistry::new().handle(self, &text) {
                self.push_system(format!("Command failed: {e}"));
            }
        } else {
            self.submit_message(text);
        }
    }

    fn submit_message(&mut self, text: String) {
        self.push_user(text.clone());
        self.is_loading = true;
        self.loading_tick = 0;
        self.scroll_to_bottom();

        let client = self.client.clone();
        let session_id = self.session_id.clone();
        let tx = self.response_tx.clone();

        tokio::spawn(async move {
            let request = AgentRequest::new(&session_id, &text);

            let event = match client.invoke(&request).await {
                Ok(reply) => WorkerEvent::Reply(Box::new(reply)),
                Err(e) => {
                    tracing::error!(error = %e, "Backend invocation failed");
                    WorkerEvent::Failed(e.to_string())
                }
            };

            let _ = tx.send(event);
        });
    }

    /// Called every tick to drain finished backend invocations.
    pub fn poll_responses(&mut self) {
        while let Ok(event) = self.response_rx.try_recv() {
            self.is_loading = false;
            match event {
                WorkerEvent::Reply(reply) => self.absorb_reply(*reply),
                WorkerEvent::Failed(_) => {
                    self.push_assistant(ERROR_PLACEHOLDER.to_string(), false);
                }
            }
            self.scroll_to_bottom();
        }
    }

    fn absorb_reply(&mut self, reply: AgentReply) {
        for raw in reply.traces() {
            self.push_trace(raw);
        }

        let answer = reply.answer();
        match format_answer_table(&answer) {
            Some(table) => self.push_assistant(table, true),
            None => self.push_assistant(answer, false),
        }
    }

    /// Record one trace payload, suppressing consecutive duplicates.
    pub fn push_trace(&mut self, raw: Value) {
        if self.traces.first().map(|t| t.raw == raw).unwrap_or(false) {
            return;
        }
        let blocks = self.tracker.process(&raw);
        self.traces.insert(
            0,
            TraceEntry {
                raw,
                blocks,
                received_at: Local::now(),
            },
        );
        self.trace_scroll = 0;
    }

    // ── session teardown ────────────────────────────────────────────────

    /// End the backend session and reset all session-local state.
    pub fn end_session(&mut self) {
        let client = self.client.clone();
        let prefix = client.config().session_prefix.clone();
        let old_session = std::mem::replace(
            &mut self.session_id,
            format!("{}-{}", prefix, uuid::Uuid::new_v4()),
        );

        tokio::spawn(async move {
            if let Err(e) = client.end_session(&old_session).await {
                tracing::warn!(error = %e, "Failed to end backend session");
            }
        });

        self.messages.clear();
        self.traces.clear();
        self.tracker.reset();
        self.scroll_offset = 0;
        self.trace_scroll = 0;
        self.is_loading = false;
        self.push_system(
            "Session ended. Thank you for using the support agent. A fresh session is ready."
                .to_string(),
        );
    }

    // ── example prompts ─────────────────────────────────────────────────

    /// Push the example prompt list as a system message, grouped by category.
    pub fn list_prompts(&mut self) {
        if self.prompts.is_empty() {
            self.push_system("No example prompts configured.".to_string());
            return;
        }

        let mut text = String::from("Example prompts (insert one with /prompts <n>):\n");
        let mut last_category = "";
        for (i, prompt) in self.prompts.iter().enumerate() {
            if prompt.category != last_category {
                text.push_str(&format!("\n{}:\n", prompt.category));
                last_category = &prompt.category;
            }
            text.push_str(&format!("  {}. {}\n", i + 1, prompt.prompt));
        }
        self.push_system(text);
    }

    /// Put example prompt `n` (1-based) into the input line.
    pub fn insert_prompt(&mut self, index: usize) -> bool {
        let prompt = index
            .checked_sub(1)
            .and_then(|i| self.prompts.get(i))
            .map(|p| p.prompt.clone());
        let Some(text) = prompt else {
            return false;
        };
        self.set_input(text);
        true
    }

    /// Advance the loading spinner animation counter.
    pub fn tick(&mut self) {
        if self.is_loading {
            self.loading_tick = self.loading_tick.wrapping_add(1);
        }
    }
}

/// Create a fresh TextArea with default styling.
fn new_textarea() -> TextArea<'static> {
    let mut ta = TextArea::default();
    ta.set_cursor_line_style(Style::default());
    ta.set_placeholder_text("Type a question... (Enter to send)");
    ta.set_max_histories(50);
    ta
}

/// Render a JSON-array answer as an aligned monospace table.
///
/// Only arrays of flat objects qualify; anything else returns `None` and the
/// answer falls through to the markdown renderer.
pub fn format_answer_table(answer: &str) -> Option<String> {
    let trimmed = answer.trim();
    if !trimmed.starts_with('[') {
        return None;
    }
    let rows: Vec<serde_json::Map<String, Value>> = serde_json::from_str(trimmed).ok()?;
    if rows.is_empty() {
        return None;
    }

    let mut columns: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let cell = |value: Option<&Value>| -> String {
        match value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    };

    let mut widths: Vec<usize> = columns.iter().map(|c| c.width()).collect();
    let mut body: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for row in &rows {
        let cells: Vec<String> = columns.iter().map(|c| cell(row.get(c))).collect();
        for (i, text) in cells.iter().enumerate() {
            widths[i] = widths[i].max(text.width());
        }
        body.push(cells);
    }

    let pad = |text: &str, width: usize| {
        let mut out = text.to_string();
        out.push_str(&" ".repeat(width.saturating_sub(text.width())));
        out
    };

    let mut table = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| pad(c, *w))
        .collect();
    table.push_str(&header.join("  "));
    table.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    table.push_str(&rule.join("  "));
    for cells in &body {
        table.push('\n');
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(c, *w))
            .collect();
        table.push_str(line.join("  ").trim_end());
    }

    Some(table)
}
