//! Core types, configuration, and error handling for prbot.
//!
//! This crate provides the shared foundation used by the other prbot crates:
//! - [`PrBotError`]: unified error type using `thiserror`
//! - [`BotConfig`]: configuration built once from `.prbot.toml` and the environment
//! - Shared types: [`PullRequestEvent`], [`Changeset`], [`ReviewResult`],
//!   [`BotComment`], [`HandlerResponse`]

mod config;
mod error;
mod event;
mod types;

pub use config::{BotConfig, GitHubConfig, LlmConfig};
pub use error::PrBotError;
pub use event::{HandlerResponse, PullRequestEvent};
pub use types::{BotComment, Changeset, FileChange, ReviewResult, BOT_COMMENT_MARKER};

/// A convenience `Result` type for prbot operations.
pub type Result<T> = std::result::Result<T, PrBotError>;
