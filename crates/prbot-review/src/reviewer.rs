use async_trait::async_trait;
use prbot_core::{PrBotError, ReviewResult};
use tracing::{debug, info};

use crate::llm::{ChatMessage, LlmClient};
use crate::pipeline::ReviewModel;
use crate::prompt;

/// Two-call reviewer: a schema-constrained summary, then free-text critique.
///
/// The critique sees the generated summary as the pull request
/// description, so an empty or placeholder description on the pull
/// request does not starve it of context.
pub struct LlmReviewer {
    llm: LlmClient,
}

impl LlmReviewer {
    /// Create a reviewer over an LLM client.
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn summarize(&self, changeset: &str) -> Result<String, PrBotError> {
        let messages = vec![ChatMessage::user(prompt::build_summary_prompt(changeset))];
        let schema = prompt::summary_schema();
        let reply = self.llm.chat(messages, Some(&schema)).await?;
        prompt::parse_summary_response(&reply)
    }

    async fn critique(
        &self,
        changeset: &str,
        title: &str,
        description: &str,
    ) -> Result<String, PrBotError> {
        let messages = vec![ChatMessage::user(prompt::build_critique_prompt(
            title,
            description,
            changeset,
        ))];
        self.llm.chat(messages, None).await
    }
}

#[async_trait]
impl ReviewModel for LlmReviewer {
    async fn generate_review(
        &self,
        changeset: &str,
        pr_title: &str,
        pr_description: &str,
    ) -> Result<ReviewResult, PrBotError> {
        debug!(
            model = self.llm.model(),
            original_description = pr_description,
            "requesting review"
        );
        let summary = self.summarize(changeset).await?;
        let feedback = self.critique(changeset, pr_title, &summary).await?;
        info!(model = self.llm.model(), "review generated");

        Ok(ReviewResult {
            pull_request_description: summary,
            feedback,
            refusal: None,
        })
    }
}

/// Reviewer that returns a prepared answer without calling any model.
///
/// Used by the local simulation harness.
///
/// # Examples
///
/// ```
/// use prbot_core::ReviewResult;
/// use prbot_review::reviewer::FixedReviewer;
///
/// let reviewer = FixedReviewer::new(ReviewResult {
///     pull_request_description: "Adds a.py".into(),
///     feedback: "Looks fine.".into(),
///     refusal: None,
/// });
/// ```
pub struct FixedReviewer {
    review: ReviewResult,
}

impl FixedReviewer {
    /// Wrap a prepared review.
    pub fn new(review: ReviewResult) -> Self {
        Self { review }
    }
}

#[async_trait]
impl ReviewModel for FixedReviewer {
    async fn generate_review(
        &self,
        _changeset: &str,
        _pr_title: &str,
        _pr_description: &str,
    ) -> Result<ReviewResult, PrBotError> {
        Ok(self.review.clone())
    }
}
