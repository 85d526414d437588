use std::fmt;

use async_trait::async_trait;
use prbot_core::{BotComment, Changeset, HandlerResponse, PrBotError, PullRequestEvent, ReviewResult};
use prbot_github::{format_changeset, CommentOutcome, GitHubClient};
use tracing::{error, info, info_span, warn, Instrument};

/// Source control operations the orchestrator depends on.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Succeeds when the configured credentials can read `repository`.
    async fn verify_repository_access(&self, repository: &str) -> Result<(), PrBotError>;

    /// Id of the existing bot comment on the pull request, if any.
    async fn find_bot_comment_id(
        &self,
        pr_number: u64,
        repository: &str,
    ) -> Result<Option<u64>, PrBotError>;

    /// Files and commits between `base_branch` and `head_branch`.
    async fn fetch_comparison(
        &self,
        repository: &str,
        base_branch: &str,
        head_branch: &str,
    ) -> Result<Changeset, PrBotError>;

    /// Create the bot comment, or replace it when `comment.id` is set.
    async fn upsert_comment(
        &self,
        repository: &str,
        pr_number: u64,
        comment: &BotComment,
    ) -> Result<CommentOutcome, PrBotError>;
}

#[async_trait]
impl SourceControl for GitHubClient {
    async fn verify_repository_access(&self, repository: &str) -> Result<(), PrBotError> {
        GitHubClient::verify_repository_access(self, repository).await
    }

    async fn find_bot_comment_id(
        &self,
        pr_number: u64,
        repository: &str,
    ) -> Result<Option<u64>, PrBotError> {
        GitHubClient::find_bot_comment_id(self, pr_number, repository).await
    }

    async fn fetch_comparison(
        &self,
        repository: &str,
        base_branch: &str,
        head_branch: &str,
    ) -> Result<Changeset, PrBotError> {
        GitHubClient::fetch_comparison(self, repository, base_branch, head_branch).await
    }

    async fn upsert_comment(
        &self,
        repository: &str,
        pr_number: u64,
        comment: &BotComment,
    ) -> Result<CommentOutcome, PrBotError> {
        GitHubClient::upsert_comment(self, repository, pr_number, comment).await
    }
}

/// Produces a review for a flattened changeset.
#[async_trait]
pub trait ReviewModel: Send + Sync {
    /// Review `changeset` in the context of the pull request title and description.
    async fn generate_review(
        &self,
        changeset: &str,
        pr_title: &str,
        pr_description: &str,
    ) -> Result<ReviewResult, PrBotError>;
}

/// Progress of one invocation.
///
/// Runs advance strictly in declaration order; `Error` is reachable from
/// any stage and, like `Done`, is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Event accepted, nothing called yet.
    Start,
    /// The token can read the repository.
    AccessChecked,
    /// Existing bot comment searched for, found or not.
    CommentLookedUp,
    /// Changeset text fetched or injected.
    ChangesetObtained,
    /// The model produced a review.
    ReviewGenerated,
    /// The bot comment was created, updated or logged offline.
    CommentUpserted,
    /// Finished with a 200 response.
    Done,
    /// Stopped early with a non-200 response.
    Error,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::AccessChecked => "access_checked",
            Stage::CommentLookedUp => "comment_looked_up",
            Stage::ChangesetObtained => "changeset_obtained",
            Stage::ReviewGenerated => "review_generated",
            Stage::CommentUpserted => "comment_upserted",
            Stage::Done => "done",
            Stage::Error => "error",
        };
        f.write_str(name)
    }
}

/// Why an invocation did not post a review.
///
/// Only `AccessDenied`, `UpstreamFetchError` and `InvalidPayload` surface as
/// non-200 responses; the rest degrade to a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The token cannot read the repository (403).
    AccessDenied,
    /// The branch comparison could not be fetched (500).
    UpstreamFetchError,
    /// The model call failed or refused; nothing was posted (200).
    ModelUnavailable,
    /// Creating or updating the comment failed (200).
    CommentWriteError,
    /// The inbound event could not be parsed (500).
    InvalidPayload,
}

/// Outcome of one orchestrated invocation.
#[derive(Debug, Clone)]
pub struct ReviewReport {
    /// Response for the invoking boundary.
    pub response: HandlerResponse,
    /// Terminal stage: `Done` or `Error`.
    pub stage: Stage,
    /// Failure encountered, if any.
    pub failure: Option<FailureKind>,
    /// What happened to the bot comment, if a write was attempted and succeeded.
    pub comment: Option<CommentOutcome>,
}

impl ReviewReport {
    /// A report for an event that never reached the orchestrator.
    pub fn rejected(error: &PrBotError) -> Self {
        Self {
            response: HandlerResponse::new(500, format!("An error occurred: {error}")),
            stage: Stage::Error,
            failure: Some(FailureKind::InvalidPayload),
            comment: None,
        }
    }
}

struct Transitions {
    stage: Stage,
}

impl Transitions {
    fn new() -> Self {
        Self { stage: Stage::Start }
    }

    fn advance(&mut self, next: Stage) {
        info!(from = %self.stage, to = %next, "stage transition");
        self.stage = next;
    }

    fn finish(
        mut self,
        event: &PullRequestEvent,
        failure: Option<FailureKind>,
        comment: Option<CommentOutcome>,
    ) -> ReviewReport {
        self.advance(Stage::Done);
        ReviewReport {
            response: HandlerResponse::new(
                200,
                format!("GitHub PR webhook processed: {}", event.action),
            ),
            stage: self.stage,
            failure,
            comment,
        }
    }

    fn fail(mut self, failure: FailureKind, response: HandlerResponse) -> ReviewReport {
        self.advance(Stage::Error);
        ReviewReport {
            response,
            stage: self.stage,
            failure: Some(failure),
            comment: None,
        }
    }
}

/// Drives one pull-request event from access check to comment upsert.
///
/// Strictly sequential; every step's failure is mapped to a [`FailureKind`]
/// rather than propagated.
pub struct Orchestrator<'a, S: ?Sized, M: ?Sized> {
    source: &'a S,
    model: &'a M,
    changeset_override: Option<String>,
}

impl<'a, S: SourceControl + ?Sized, M: ReviewModel + ?Sized> Orchestrator<'a, S, M> {
    /// Create an orchestrator over a source control client and a review model.
    pub fn new(source: &'a S, model: &'a M) -> Self {
        Self {
            source,
            model,
            changeset_override: None,
        }
    }

    /// Use `changeset` verbatim instead of fetching the comparison.
    pub fn with_changeset_override(mut self, changeset: impl Into<String>) -> Self {
        self.changeset_override = Some(changeset.into());
        self
    }

    /// Run the pipeline for `event`. Never fails; see [`ReviewReport`].
    pub async fn run(&self, event: &PullRequestEvent) -> ReviewReport {
        let span = info_span!(
            "review",
            pr = event.number,
            repository = %event.repository_full_name,
            base = %event.base_branch,
            head = %event.head_branch,
        );
        self.drive(event).instrument(span).await
    }

    async fn drive(&self, event: &PullRequestEvent) -> ReviewReport {
        let repository = event.repository_full_name.as_str();
        let mut run = Transitions::new();

        if let Err(e) = self.source.verify_repository_access(repository).await {
            error!(error = %e, "repository access check failed");
            return run.fail(
                FailureKind::AccessDenied,
                HandlerResponse::new(
                    403,
                    format!("API key does not have access to the repository: {repository}"),
                ),
            );
        }
        run.advance(Stage::AccessChecked);

        let comment_id = match self.source.find_bot_comment_id(event.number, repository).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "could not list comments; a new comment will be created");
                None
            }
        };
        run.advance(Stage::CommentLookedUp);

        let changeset = match &self.changeset_override {
            Some(text) => {
                info!("using injected changeset");
                text.clone()
            }
            None => match self
                .source
                .fetch_comparison(repository, &event.base_branch, &event.head_branch)
                .await
            {
                Ok(changeset) => format_changeset(&changeset),
                Err(e) => {
                    error!(error = %e, "failed to fetch comparison");
                    return run.fail(
                        FailureKind::UpstreamFetchError,
                        HandlerResponse::new(500, format!("An error occurred: {e}")),
                    );
                }
            },
        };
        run.advance(Stage::ChangesetObtained);

        let review = match self
            .model
            .generate_review(&changeset, &event.title, &event.description)
            .await
        {
            Ok(ReviewResult {
                refusal: Some(reason),
                ..
            }) => {
                warn!(refusal = %reason, "model refused to review; skipping comment");
                return run.finish(event, Some(FailureKind::ModelUnavailable), None);
            }
            Ok(review) => review,
            Err(e) => {
                warn!(error = %e, "no review produced; skipping comment");
                return run.finish(event, Some(FailureKind::ModelUnavailable), None);
            }
        };
        run.advance(Stage::ReviewGenerated);

        let comment = BotComment::new(comment_id, review.comment_body());
        match self
            .source
            .upsert_comment(repository, event.number, &comment)
            .await
        {
            Ok(outcome) => {
                run.advance(Stage::CommentUpserted);
                run.finish(event, None, Some(outcome))
            }
            Err(e) => {
                warn!(error = %e, "failed to write review comment");
                run.finish(event, Some(FailureKind::CommentWriteError), None)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;

    #[tokio::test]
    async fn access_denied_stops_everything() {
        let source = FakeSource {
            access: false,
            ..FakeSource::default()
        };
        let model = FakeModel::answering("d", "f");
        let report = Orchestrator::new(&source, &model).run(&sample_event()).await;

        assert_eq!(report.response.status_code, 403);
        assert_eq!(
            report.response.message().as_deref(),
            Some("API key does not have access to the repository: user/sample-repo")
        );
        assert_eq!(report.stage, Stage::Error);
        assert_eq!(report.failure, Some(FailureKind::AccessDenied));
        assert_eq!(
            source.calls(),
            vec![Call::VerifyAccess("user/sample-repo".into())]
        );
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn creates_one_comment_when_none_exists() {
        let source = FakeSource::default();
        let model = FakeModel::answering("Adds a.py", "Looks fine.");
        let report = Orchestrator::new(&source, &model).run(&sample_event()).await;

        assert_eq!(report.response.status_code, 200);
        assert_eq!(report.stage, Stage::Done);
        assert_eq!(report.failure, None);
        assert_eq!(report.comment, Some(CommentOutcome::Created { id: 1 }));
        assert_eq!(
            source.upserts(),
            vec![BotComment::new(None, "Adds a.py\nLooks fine.")]
        );
    }

    #[tokio::test]
    async fn existing_comment_is_updated_not_duplicated() {
        let source = FakeSource {
            existing_comment: Some(42),
            ..FakeSource::default()
        };
        let model = FakeModel::answering("d", "f");
        let report = Orchestrator::new(&source, &model).run(&sample_event()).await;

        assert_eq!(report.comment, Some(CommentOutcome::Updated { id: 42 }));
        let upserts = source.upserts();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].id, Some(42));
    }

    #[tokio::test]
    async fn model_failure_is_soft() {
        let source = FakeSource::default();
        let model = FakeModel::failing();
        let report = Orchestrator::new(&source, &model).run(&sample_event()).await;

        assert_eq!(report.response.status_code, 200);
        assert_eq!(report.stage, Stage::Done);
        assert_eq!(report.failure, Some(FailureKind::ModelUnavailable));
        assert!(source.upserts().is_empty());
    }

    #[tokio::test]
    async fn refusal_is_soft() {
        let source = FakeSource::default();
        let model = FakeModel {
            reply: Some(ReviewResult {
                pull_request_description: String::new(),
                feedback: String::new(),
                refusal: Some("declined".into()),
            }),
            seen: Default::default(),
        };
        let report = Orchestrator::new(&source, &model).run(&sample_event()).await;

        assert_eq!(report.response.status_code, 200);
        assert_eq!(report.failure, Some(FailureKind::ModelUnavailable));
        assert!(source.upserts().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_is_500() {
        let source = FakeSource {
            fail_fetch: true,
            ..FakeSource::default()
        };
        let model = FakeModel::answering("d", "f");
        let report = Orchestrator::new(&source, &model).run(&sample_event()).await;

        assert_eq!(report.response.status_code, 500);
        assert!(report
            .response
            .message()
            .unwrap()
            .starts_with("An error occurred: "));
        assert_eq!(report.failure, Some(FailureKind::UpstreamFetchError));
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn comment_write_failure_still_reports_success() {
        let source = FakeSource {
            fail_write: true,
            ..FakeSource::default()
        };
        let model = FakeModel::answering("d", "f");
        let report = Orchestrator::new(&source, &model).run(&sample_event()).await;

        assert_eq!(report.response.status_code, 200);
        assert_eq!(report.stage, Stage::Done);
        assert_eq!(report.failure, Some(FailureKind::CommentWriteError));
        assert_eq!(report.comment, None);
    }

    #[tokio::test]
    async fn lookup_failure_falls_back_to_create() {
        let source = FakeSource {
            fail_lookup: true,
            existing_comment: Some(42),
            ..FakeSource::default()
        };
        let model = FakeModel::answering("d", "f");
        let report = Orchestrator::new(&source, &model).run(&sample_event()).await;

        assert_eq!(report.comment, Some(CommentOutcome::Created { id: 1 }));
    }

    #[tokio::test]
    async fn fetched_comparison_is_formatted_for_the_model() {
        let source = FakeSource::default();
        let model = FakeModel::answering("d", "f");
        Orchestrator::new(&source, &model).run(&sample_event()).await;

        assert!(source
            .calls()
            .contains(&Call::FetchComparison("main".into(), "feature-branch".into())));
        assert_eq!(
            model.seen.lock().unwrap().as_slice(),
            ["File: a.py\nChanges:\n+pass\n\nCommit Messages:\nadd a.py".to_string()]
        );
    }

    #[tokio::test]
    async fn override_skips_fetch() {
        let source = FakeSource::default();
        let model = FakeModel::answering("d", "f");
        Orchestrator::new(&source, &model)
            .with_changeset_override("File: a.py\nChanges:\n+pass")
            .run(&sample_event())
            .await;

        assert!(!source
            .calls()
            .iter()
            .any(|c| matches!(c, Call::FetchComparison(..))));
        assert_eq!(
            model.seen.lock().unwrap().as_slice(),
            ["File: a.py\nChanges:\n+pass".to_string()]
        );
    }

    #[test]
    fn stage_names_are_snake_case() {
        assert_eq!(Stage::CommentLookedUp.to_string(), "comment_looked_up");
        assert_eq!(Stage::Error.to_string(), "error");
    }
}
