//! Minimal client for OpenAI-compatible chat-completion endpoints.
//!
//! Exposes the wire types (`ChatRequest`, `WireMessage`, `ChatResponse`),
//! a `CompletionClient` that posts them, and the response-text utilities
//! callers need before handing model output to a parser.

mod client;
mod error;
pub mod types;
pub mod util;

pub use client::CompletionClient;
pub use error::CompletionError;
pub use types::{ChatRequest, ChatResponse, Role, Usage, WireMessage};
