use serde::{Deserialize, Serialize};

/// Phrase that identifies the bot's own comment on a pull request.
pub const BOT_COMMENT_MARKER: &str = "Automated Code Review";

const NEW_COMMENT_HEADER: &str = "**EXPERIMENTAL: Automated Code Review**";
const UPDATED_COMMENT_HEADER: &str = "**EXPERIMENTAL: Automated Code Review (Updated)**";

/// One changed file from a branch comparison.
///
/// # Examples
///
/// ```
/// use prbot_core::FileChange;
///
/// let change = FileChange {
///     filename: "src/lib.rs".into(),
///     patch: "@@ -1 +1 @@\n-a\n+b".into(),
/// };
/// assert_eq!(change.filename, "src/lib.rs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path of the file relative to the repository root.
    pub filename: String,
    /// Unified-diff fragment; empty for binary or oversized files.
    pub patch: String,
}

/// Files and commit messages between two branches, in API order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    /// Changed files.
    pub files: Vec<FileChange>,
    /// Commit messages, oldest first.
    pub commit_messages: Vec<String>,
}

/// Structured output of the language model for one pull request.
///
/// # Examples
///
/// ```
/// use prbot_core::ReviewResult;
///
/// let review: ReviewResult = serde_json::from_str(
///     r#"{"pullRequestDescription":"Adds a.py","feedback":"Looks fine."}"#,
/// )
/// .unwrap();
/// assert!(review.refusal.is_none());
/// assert_eq!(review.comment_body(), "Adds a.py\nLooks fine.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    /// Summary of what the pull request does.
    pub pull_request_description: String,
    /// Markdown review feedback.
    pub feedback: String,
    /// Set when the model declined to review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<String>,
}

impl ReviewResult {
    /// Text posted on the pull request, before the header is added.
    pub fn comment_body(&self) -> String {
        format!("{}\n{}", self.pull_request_description, self.feedback)
    }
}

/// The single automated review comment on a pull request.
///
/// `id` is `Some` when a previous comment was found and will be replaced.
///
/// # Examples
///
/// ```
/// use prbot_core::BotComment;
///
/// let fresh = BotComment::new(None, "body");
/// assert!(fresh.rendered().starts_with("**EXPERIMENTAL: Automated Code Review**"));
///
/// let update = BotComment::new(Some(42), "body");
/// assert!(update.rendered().contains("(Updated)"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotComment {
    /// Id of the existing comment to update.
    pub id: Option<u64>,
    /// Review text without the header.
    pub body: String,
}

impl BotComment {
    /// Create a comment targeting `id`, or a new comment when `None`.
    pub fn new(id: Option<u64>, body: impl Into<String>) -> Self {
        Self {
            id,
            body: body.into(),
        }
    }

    /// Whether a comment body carries the bot marker.
    pub fn is_marked(body: &str) -> bool {
        body.contains(BOT_COMMENT_MARKER)
    }

    /// Full body sent to the API: header, blank line, review text.
    pub fn rendered(&self) -> String {
        let header = if self.id.is_some() {
            UPDATED_COMMENT_HEADER
        } else {
            NEW_COMMENT_HEADER
        };
        format!("{header}\n\n{}", self.body)
    }
}
