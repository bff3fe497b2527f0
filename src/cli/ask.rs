//! One-shot question command
//!
//! Submits a single question on a fresh session, prints the answer to
//! stdout, and optionally walks the trace onto stderr.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use confab_backend::{AgentRequest, BackendClient};
use confab_trace::{render_plain, StepTracker};
use uuid::Uuid;

/// Run the `ask` subcommand
pub async fn run(config: AppConfig, question: String, show_trace: bool) -> Result<()> {
    let backend_config = config.backend_config();
    let session_id = format!("{}-{}", backend_config.session_prefix, Uuid::new_v4());
    let client = BackendClient::new(backend_config).context("Failed to build backend client")?;

    let request = AgentRequest::new(&session_id, question.trim());
    let reply = client
        .invoke(&request)
        .await
        .context("Backend invocation failed")?;

    if show_trace {
        let mut tracker = StepTracker::new();
        for (i, raw) in reply.traces().iter().enumerate() {
            let blocks = tracker.process(raw);
            eprintln!("--- trace {} ---", i + 1);
            eprint!("{}", render_plain(&blocks));
        }
        let usage = tracker.usage();
        if !usage.is_empty() {
            eprintln!(
                "--- tokens: {} in / {} out ---",
                usage.input_tokens, usage.output_tokens
            );
        }
    }

    println!("{}", reply.answer());
    Ok(())
}
