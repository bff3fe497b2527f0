//! TUI rendering with ratatui

use chrono::Timelike;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::app::{App, Role};
use confab_trace::TraceBlock;

const SPINNER_FRAMES: &[&str] = &["   ", ".  ", ".. ", "..."];

/// Width of the trace side panel.
const TRACE_PANEL_WIDTH: u16 = 44;

/// Main draw function - renders the full TUI layout.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(3),    // body
            Constraint::Length(1), // suggestions
            Constraint::Length(3), // input (height 3 to show border clearly)
        ])
        .split(frame.area());

    draw_status_bar(frame, app, outer[0]);
    draw_body(frame, app, outer[1]);
    draw_suggestions(frame, app, outer[2]);
    draw_input(frame, app, outer[3]);
}

// ── status bar ──────────────────────────────────────────────────────────

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let version = env!("CARGO_PKG_VERSION");

    let info_text = format!(
        " Confab v{} \u{00b7} {} \u{00b7} {}",
        version,
        short_session(&app.session_id),
        app.endpoint(),
    );

    let center = if app.is_loading {
        let dots = SPINNER_FRAMES[app.loading_tick % SPINNER_FRAMES.len()];
        format!("Thinking{}", dots)
    } else {
        String::new()
    };

    let mut right_parts: Vec<String> = Vec::new();
    if let Some(collaborator) = app.tracker.collaborator() {
        right_parts.push(format!("via {}", collaborator));
    }
    let usage = app.tracker.usage();
    if !usage.is_empty() {
        right_parts.push(format!(
            "tokens {} in / {} out",
            usage.input_tokens, usage.output_tokens
        ));
    }
    let right = right_parts.join(" \u{00b7} ");

    let mut spans = vec![Span::raw(info_text)];

    // Distribute the remaining width between left/center/right segments.
    let current_len: usize = spans.iter().map(|s| s.content.width()).sum();
    let center_len = center.width();
    let right_len = right.width();
    let width = area.width as usize;

    let total_used = current_len + center_len + right_len;
    let remaining = width.saturating_sub(total_used);
    let left_spacer = remaining / 2;
    let right_spacer = remaining.saturating_sub(left_spacer);

    if left_spacer > 0 {
        spans.push(Span::raw(" ".repeat(left_spacer)));
    }
    if !center.is_empty() {
        spans.push(Span::styled(center, Style::default().fg(Color::Yellow).bold()));
    }
    if right_spacer > 0 {
        spans.push(Span::raw(" ".repeat(right_spacer)));
    }
    if !right.is_empty() {
        spans.push(Span::styled(right, Style::default().fg(Color::Cyan)));
    }

    let line = Line::from(spans);
    let p =
        Paragraph::new(line).style(Style::default().bg(Color::Rgb(20, 20, 20)).fg(Color::White));
    frame.render_widget(p, area);
}

// ── body: chat + optional trace panel ──────────────────────────────────

fn draw_body(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.show_traces {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(20),
                Constraint::Length(TRACE_PANEL_WIDTH),
            ])
            .split(area);
        draw_chat(frame, app, body[0]);
        draw_traces(frame, app, body[1]);
    } else {
        draw_chat(frame, app, area);
    }
}

fn draw_chat(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let mut all_lines: Vec<Line> = Vec::new();
    for msg in &app.messages {
        let (role_style, role_name) = match msg.role {
            Role::User => (Style::default().bold(), "You".to_string()),
            Role::Assistant => (Style::default().fg(Color::Cyan).bold(), msg.sender.clone()),
            Role::System => (
                Style::default().fg(Color::Magenta).italic(),
                msg.sender.clone(),
            ),
        };

        let ts = msg.timestamp;
        let time_str = format!("{:02}:{:02}", ts.hour(), ts.minute());

        // Header: [12:30] Role
        all_lines.push(Line::from(vec![
            Span::styled(format!("[{}] ", time_str), Style::default().fg(Color::DarkGray)),
            Span::styled(role_name, role_style),
        ]));

        // Content
        if msg.role == Role::Assistant && !msg.preformatted {
            let md_text = tui_markdown::from_str(&msg.content);
            for line in md_text.lines {
                let mut indented = vec![Span::raw("  ")];
                indented.extend(line.spans);
                all_lines.push(Line::from(indented));
            }
        } else {
            let content_style = match msg.role {
                Role::System => Style::default().fg(Color::Gray),
                _ => Style::default(),
            };
            for line_text in msg.content.split('\n') {
                all_lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(line_text.to_string(), content_style),
                ]));
            }
        }
        // Spacer between messages
        all_lines.push(Line::raw(""));
    }

    // Loading indicator inline
    if app.is_loading {
        let dots = SPINNER_FRAMES[app.loading_tick % SPINNER_FRAMES.len()];
        all_lines.push(Line::from(vec![
            Span::styled("agent ", Style::default().fg(Color::Magenta).bold()),
            Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).italic(),
            ),
        ]));
    }

    let text = Text::from(all_lines);
    let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });

    // Scroll logic: offset counts lines up from the bottom.
    let total_lines = paragraph.line_count(inner.width) as u16;
    let view_height = inner.height;
    let max_scroll = total_lines.saturating_sub(view_height);

    let scroll_pos = if app.scroll_offset > max_scroll as usize {
        0
    } else {
        max_scroll.saturating_sub(app.scroll_offset as u16)
    };

    app.scrollbar_state =
        ScrollbarState::new(max_scroll as usize).position((max_scroll - scroll_pos) as usize);

    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("\u{25b2}"))
            .end_symbol(Some("\u{25bc}"))
            .track_symbol(Some("\u{2502}"))
            .thumb_symbol("\u{2588}"),
        area,
        &mut app.scrollbar_state,
    );

    frame.render_widget(paragraph.scroll((scroll_pos, 0)), inner);
}

// ── trace panel ────────────────────────────────────────────────────────

fn draw_traces(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .title(" Trace Data ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let mut lines: Vec<Line> = Vec::new();

    if !app.tracker.step().is_start() {
        lines.push(Line::from(vec![
            Span::styled("Step: ", Style::default().fg(Color::DarkGray)),
            Span::styled(app.tracker.step().to_string(), Style::default().bold()),
        ]));
        lines.push(Line::raw(""));
    }

    if app.traces.is_empty() {
        lines.push(Line::from(Span::styled(
            "(no traces yet)",
            Style::default().fg(Color::DarkGray).italic(),
        )));
    }

    for (idx, entry) in app.traces.iter().enumerate() {
        let ts = entry.received_at;
        lines.push(Line::from(Span::styled(
            format!(
                "Trace {} \u{00b7} {:02}:{:02}:{:02}",
                idx + 1,
                ts.hour(),
                ts.minute(),
                ts.second()
            ),
            Style::default().fg(Color::Yellow).bold(),
        )));

        for trace_block in &entry.blocks {
            push_block_lines(&mut lines, trace_block);
        }
        lines.push(Line::raw(""));
    }

    let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });

    // Scroll from the top; newest entries sit at offset zero.
    let total_lines = paragraph.line_count(inner.width);
    let max_scroll = total_lines.saturating_sub(inner.height as usize);
    if app.trace_scroll > max_scroll {
        app.trace_scroll = max_scroll;
    }

    frame.render_widget(paragraph.scroll((app.trace_scroll as u16, 0)), inner);
}

fn push_block_lines<'a>(lines: &mut Vec<Line<'a>>, block: &'a TraceBlock) {
    match block {
        TraceBlock::Heading(text) => {
            lines.push(Line::from(Span::styled(
                text.as_str(),
                Style::default().fg(Color::Cyan).bold(),
            )));
        }
        TraceBlock::SubHeading(text) => {
            lines.push(Line::from(Span::styled(
                text.as_str(),
                Style::default().fg(Color::Blue).bold(),
            )));
        }
        TraceBlock::Note(text) => {
            lines.push(Line::from(Span::styled(
                text.as_str(),
                Style::default().fg(Color::DarkGray).italic(),
            )));
        }
        TraceBlock::Field(label, value) => {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {}: ", label),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(value.as_str()),
            ]));
        }
        TraceBlock::Code(code) => {
            for code_line in code.lines() {
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(code_line, Style::default().fg(Color::Gray)),
                ]));
            }
        }
        TraceBlock::Quote(text) => {
            for text_line in text.lines() {
                lines.push(Line::from(vec![Span::raw("  "), Span::raw(text_line)]));
            }
        }
    }
}

// ── suggestions + input ────────────────────────────────────────────────

fn draw_suggestions(frame: &mut Frame, app: &App, area: Rect) {
    if app.suggestions.is_empty() {
        return;
    }

    let mut spans = vec![Span::styled(
        "Suggest: ",
        Style::default().fg(Color::DarkGray),
    )];
    for suggest in &app.suggestions {
        spans.push(Span::styled(
            format!("/{} ", suggest),
            Style::default().fg(Color::Yellow).bold(),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.is_loading {
        " Input (waiting for agent) "
    } else {
        " Input "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(title);

    let mut textarea = app.textarea.clone();
    textarea.set_block(block);
    frame.render_widget(&textarea, area);
}

/// Shorten a session id for the status bar ("confab-1a2b3c4d").
fn short_session(session_id: &str) -> String {
    const MAX: usize = 16;
    if session_id.chars().count() <= MAX {
        session_id.to_string()
    } else {
        let head: String = session_id.chars().take(MAX).collect();
        format!("{head}\u{2026}")
    }
}
