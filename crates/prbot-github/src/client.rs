use prbot_core::{BotComment, BotConfig, Changeset, PrBotError};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, info};

use crate::changeset::CompareResponse;
use crate::urls::GitHubUrls;

const ACCEPT: &str = "application/vnd.github.v3+json";
const COMMENTS_PER_PAGE: &str = "100";

/// What happened to the bot comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    /// A new comment was posted.
    Created {
        /// Id assigned by GitHub.
        id: u64,
    },
    /// The existing comment was replaced.
    Updated {
        /// Id of the replaced comment.
        id: u64,
    },
    /// Offline mode: nothing was sent. Carries the exact body that would have been.
    Skipped {
        /// Rendered comment body.
        body: String,
    },
}

#[derive(Debug, Deserialize)]
struct IssueComment {
    id: u64,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    user: Option<CommentAuthor>,
}

#[derive(Debug, Deserialize)]
struct CommentAuthor {
    login: String,
}

#[derive(Debug, Deserialize)]
struct CreatedComment {
    id: u64,
}

/// GitHub REST client for repository access checks, branch comparisons and
/// the bot comment.
///
/// In offline mode every method returns without touching the network.
///
/// # Examples
///
/// ```
/// use prbot_core::BotConfig;
/// use prbot_github::GitHubClient;
///
/// let config = BotConfig { offline: true, ..BotConfig::default() };
/// let client = GitHubClient::new(&config).unwrap();
/// assert!(client.is_offline());
/// ```
pub struct GitHubClient {
    http: reqwest::Client,
    urls: GitHubUrls,
    token: String,
    bot_login: Option<String>,
    offline: bool,
}

impl GitHubClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PrBotError::Config`] if no token is configured outside
    /// offline mode, or [`PrBotError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &BotConfig) -> Result<Self, PrBotError> {
        let token = config.github_token()?.to_string();
        let http = reqwest::Client::builder()
            .user_agent("prbot")
            .build()
            .map_err(|e| PrBotError::Http(format!("failed to create GitHub client: {e}")))?;

        Ok(Self {
            http,
            urls: GitHubUrls::new(config.github.api_base_url.clone()),
            token,
            bot_login: config.github.bot_login.clone(),
            offline: config.offline,
        })
    }

    /// Whether outbound calls are suppressed.
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("Accept", ACCEPT)
            .header("Authorization", format!("Bearer {}", self.token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, PrBotError> {
        let response = request
            .send()
            .await
            .map_err(|e| PrBotError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PrBotError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Check that the token can read `repository`.
    ///
    /// # Errors
    ///
    /// Returns [`PrBotError::Http`] or [`PrBotError::Api`] when the
    /// repository is unreachable with this token.
    pub async fn verify_repository_access(&self, repository: &str) -> Result<(), PrBotError> {
        if self.offline {
            info!(repository, "offline mode: skipping repository access check");
            return Ok(());
        }

        let url = self.urls.repository(repository);
        self.send(self.request(Method::GET, &url)).await?;
        info!(repository, "repository access verified");
        Ok(())
    }

    /// Find the id of the bot's review comment on a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`PrBotError::Http`], [`PrBotError::Api`] or
    /// [`PrBotError::Serialization`] if the comments cannot be listed.
    pub async fn find_bot_comment_id(
        &self,
        pr_number: u64,
        repository: &str,
    ) -> Result<Option<u64>, PrBotError> {
        if self.offline {
            info!("offline mode: skipping bot comment lookup");
            return Ok(None);
        }

        let url = self.urls.comments(repository, pr_number);
        let response = self
            .send(
                self.request(Method::GET, &url)
                    .query(&[("per_page", COMMENTS_PER_PAGE)]),
            )
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PrBotError::Http(e.to_string()))?;
        let comments: Vec<IssueComment> = serde_json::from_slice(&bytes)?;

        debug!(count = comments.len(), "checking comments for an existing review");
        Ok(first_bot_comment(&comments, self.bot_login.as_deref()))
    }

    /// Create the bot comment, or replace it when `comment.id` is set.
    ///
    /// # Errors
    ///
    /// Returns [`PrBotError::Http`], [`PrBotError::Api`] or
    /// [`PrBotError::Serialization`] if the write fails.
    pub async fn upsert_comment(
        &self,
        repository: &str,
        pr_number: u64,
        comment: &BotComment,
    ) -> Result<CommentOutcome, PrBotError> {
        let body = comment.rendered();

        if self.offline {
            info!(pr_number, "offline mode: not posting comment");
            info!("review content:\n{}", comment.body);
            debug!(payload = %body, "comment payload");
            return Ok(CommentOutcome::Skipped { body });
        }

        let payload = serde_json::json!({ "body": body });
        match comment.id {
            Some(id) => {
                let url = self.urls.comment(repository, id);
                self.send(self.request(Method::PATCH, &url).json(&payload))
                    .await?;
                info!(pr_number, comment_id = id, "updated review comment");
                Ok(CommentOutcome::Updated { id })
            }
            None => {
                let url = self.urls.comments(repository, pr_number);
                let response = self
                    .send(self.request(Method::POST, &url).json(&payload))
                    .await?;
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| PrBotError::Http(e.to_string()))?;
                let created: CreatedComment = serde_json::from_slice(&bytes)?;
                info!(pr_number, comment_id = created.id, "posted review comment");
                Ok(CommentOutcome::Created { id: created.id })
            }
        }
    }

    /// Fetch the files and commits between two branches.
    ///
    /// Offline, returns an empty changeset.
    ///
    /// # Errors
    ///
    /// Returns [`PrBotError::Http`] or [`PrBotError::Api`] on request
    /// failure and [`PrBotError::Serialization`] on an unexpected body.
    pub async fn fetch_comparison(
        &self,
        repository: &str,
        base_branch: &str,
        head_branch: &str,
    ) -> Result<Changeset, PrBotError> {
        if self.offline {
            info!(base_branch, head_branch, "offline mode: skipping comparison fetch");
            return Ok(Changeset::default());
        }

        let url = self.urls.compare(repository, base_branch, head_branch);
        let response = self.send(self.request(Method::GET, &url)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PrBotError::Http(e.to_string()))?;
        let comparison: CompareResponse = serde_json::from_slice(&bytes)?;
        let changeset = Changeset::from(comparison);

        debug!(
            files = changeset.files.len(),
            commits = changeset.commit_messages.len(),
            "fetched comparison"
        );
        Ok(changeset)
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("urls", &self.urls)
            .field("offline", &self.offline)
            .finish_non_exhaustive()
    }
}

/// First comment carrying the marker, optionally restricted to one author.
fn first_bot_comment(comments: &[IssueComment], bot_login: Option<&str>) -> Option<u64> {
    comments
        .iter()
        .filter(|c| c.body.as_deref().is_some_and(BotComment::is_marked))
        .find(|c| match bot_login {
            Some(login) => c.user.as_ref().is_some_and(|u| u.login == login),
            None => true,
        })
        .map(|c| c.id)
}
