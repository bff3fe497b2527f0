//! TUI chat interface for Confab
//!
//! Provides a full-screen terminal UI using ratatui + crossterm: chat
//! history on the left, the backend's execution trace on the right.

pub mod app;
pub mod command;
pub mod event;
pub mod ui;

use anyhow::{Context, Result};
use confab_backend::BackendClient;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tracing::info;

use crate::config::AppConfig;
use app::App;

/// Run the TUI chat interface.
pub async fn run(config: AppConfig) -> Result<()> {
    // ── Backend client ──────────────────────────────────────────────

    let backend_config = config.backend_config();
    info!("TUI: backend endpoint = {}", backend_config.endpoint);

    let client =
        BackendClient::new(backend_config).context("Failed to build backend client")?;

    // ── Terminal setup ──────────────────────────────────────────────

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = App::new(client, config.prompts);

    // ── Main loop ───────────────────────────────────────────────────

    let tick_rate = Duration::from_millis(200);

    let run_result: Result<()> = loop {
        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        if let Err(e) = event::handle_events(&mut app, tick_rate) {
            break Err(e);
        }

        if app.should_quit {
            break Ok(());
        }
    };

    // ── Restore terminal ────────────────────────────────────────────

    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    run_result
}
