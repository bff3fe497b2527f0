//! Confab Backend - Agent Backend Invocation
//!
//! This crate talks to the remote multi-agent orchestration backend:
//! - Types: the request/response wire contract (`sessionId`/`question` in,
//!   `response`/`trace_data` out, wrapped in a Lambda-style `body` envelope)
//! - Client: a `reqwest`-based handler invocation with typed errors
//!
//! The backend itself is opaque; this crate only knows the JSON shape it
//! exchanges.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod types;

#[cfg(test)]
mod tests;

pub use client::{parse_reply, BackendClient};
pub use error::{Error, Result};
pub use types::{AgentReply, AgentRequest, BackendConfig, END_SESSION_QUESTION};
