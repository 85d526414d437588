//! GitHub REST integration for prbot.
//!
//! Endpoint construction, the source control client used by the review
//! orchestrator, and flattening of branch comparisons into changeset text.

pub mod changeset;
pub mod client;
pub mod urls;

pub use changeset::format_changeset;
pub use client::{CommentOutcome, GitHubClient};
pub use urls::GitHubUrls;
