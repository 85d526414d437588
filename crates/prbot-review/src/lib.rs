//! Review orchestration for prbot.
//!
//! Provides the language-model client, prompt construction, the reviewer
//! that turns a changeset into a [`prbot_core::ReviewResult`], the
//! orchestrator that drives one pull-request event end to end, and the
//! event handler that wraps it for a function-style entry point.

pub mod handler;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod reviewer;
