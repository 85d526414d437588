//! Function-style entry point: raw event in, status and message out.

use prbot_core::PullRequestEvent;
use tracing::{error, info};

use crate::pipeline::{Orchestrator, ReviewModel, ReviewReport, SourceControl};

/// Changeset used in offline mode when none is injected.
pub const STUB_CHANGESET: &str = "Stubbed changeset for testing.";

/// Per-invocation options.
#[derive(Debug, Clone, Default)]
pub struct HandlerOptions {
    /// Offline mode: without an override, the stub changeset is reviewed.
    pub offline: bool,
    /// Review this text instead of fetching the comparison.
    pub changeset_override: Option<String>,
}

impl HandlerOptions {
    fn changeset(&self) -> Option<String> {
        match (&self.changeset_override, self.offline) {
            (Some(text), _) => Some(text.clone()),
            (None, true) => Some(STUB_CHANGESET.to_string()),
            (None, false) => None,
        }
    }
}

/// Handle an envelope `{"body": "<webhook json>"}`.
///
/// A malformed payload yields a 500 report without touching either client.
pub async fn handle_event<S, M>(
    raw_event: &str,
    source: &S,
    model: &M,
    options: &HandlerOptions,
) -> ReviewReport
where
    S: SourceControl + ?Sized,
    M: ReviewModel + ?Sized,
{
    let event = match PullRequestEvent::from_envelope(raw_event) {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "rejecting malformed event");
            return ReviewReport::rejected(&e);
        }
    };
    handle_pull_request(&event, source, model, options).await
}

/// Handle an already parsed event.
pub async fn handle_pull_request<S, M>(
    event: &PullRequestEvent,
    source: &S,
    model: &M,
    options: &HandlerOptions,
) -> ReviewReport
where
    S: SourceControl + ?Sized,
    M: ReviewModel + ?Sized,
{
    info!(
        pr = event.number,
        title = %event.title,
        action = %event.action,
        repository = %event.repository_full_name,
        base = %event.base_branch,
        head = %event.head_branch,
        "received pull request event"
    );

    let mut orchestrator = Orchestrator::new(source, model);
    if let Some(changeset) = options.changeset() {
        orchestrator = orchestrator.with_changeset_override(changeset);
    }
    orchestrator.run(event).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fakes::{Call, FakeModel, FakeSource};
    use crate::pipeline::{FailureKind, Stage};
    use prbot_core::{BotComment, BotConfig};
    use prbot_github::{CommentOutcome, GitHubClient};

    fn envelope(number: u64) -> String {
        let body = serde_json::json!({
            "action": "opened",
            "pull_request": {
                "title": "Sample Pull Request Title",
                "number": number,
                "body": "Sample Pull Request Description",
                "base": {"ref": "main"},
                "head": {"ref": "feature-branch"}
            },
            "repository": {"name": "sample-repo", "full_name": "user/sample-repo"}
        });
        serde_json::json!({ "body": body.to_string() }).to_string()
    }

    #[tokio::test]
    async fn offline_end_to_end_logs_instead_of_posting() {
        // Unroutable API root: any request that escaped offline mode would fail.
        let mut config = BotConfig {
            offline: true,
            ..BotConfig::default()
        };
        config.github.api_base_url = "http://127.0.0.1:9".into();
        let source = GitHubClient::new(&config).unwrap();
        let model = FakeModel::answering("Adds a.py", "Looks fine.");
        let options = HandlerOptions {
            offline: true,
            changeset_override: Some("File: a.py\nChanges:\n+pass".into()),
        };

        let report = handle_event(&envelope(1), &source, &model, &options).await;

        assert_eq!(report.response.status_code, 200);
        assert_eq!(
            report.response.message().as_deref(),
            Some("GitHub PR webhook processed: opened")
        );
        assert_eq!(report.stage, Stage::Done);
        assert_eq!(report.failure, None);
        assert_eq!(
            report.comment,
            Some(CommentOutcome::Skipped {
                body: BotComment::new(None, "Adds a.py\nLooks fine.").rendered()
            })
        );
        assert_eq!(
            model.seen.lock().unwrap().as_slice(),
            ["File: a.py\nChanges:\n+pass".to_string()]
        );
    }

    #[tokio::test]
    async fn offline_without_override_reviews_stub() {
        let source = FakeSource::default();
        let model = FakeModel::answering("d", "f");
        let options = HandlerOptions {
            offline: true,
            changeset_override: None,
        };

        handle_event(&envelope(1), &source, &model, &options).await;

        assert_eq!(
            model.seen.lock().unwrap().as_slice(),
            [STUB_CHANGESET.to_string()]
        );
    }

    #[tokio::test]
    async fn online_fetches_comparison() {
        let source = FakeSource::default();
        let model = FakeModel::answering("d", "f");

        handle_event(&envelope(5), &source, &model, &HandlerOptions::default()).await;

        let calls = source.calls();
        assert_eq!(calls[1], Call::FindComment(5));
        assert!(calls.contains(&Call::FetchComparison(
            "main".into(),
            "feature-branch".into()
        )));
    }

    #[tokio::test]
    async fn malformed_event_is_500_without_calls() {
        let source = FakeSource::default();
        let model = FakeModel::answering("d", "f");

        let report = handle_event(
            r#"{"body": "not json"}"#,
            &source,
            &model,
            &HandlerOptions::default(),
        )
        .await;

        assert_eq!(report.response.status_code, 500);
        assert_eq!(report.failure, Some(FailureKind::InvalidPayload));
        assert!(source.calls().is_empty());
    }
}
