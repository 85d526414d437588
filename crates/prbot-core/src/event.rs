use serde::{Deserialize, Serialize};

use crate::error::PrBotError;

/// A pull-request webhook event, flattened to the fields the reviewer uses.
///
/// # Examples
///
/// ```
/// use prbot_core::PullRequestEvent;
///
/// let event = PullRequestEvent::from_payload(
///     r#"{"action":"opened","pull_request":{"number":1}}"#,
/// )
/// .unwrap();
/// assert_eq!(event.number, 1);
/// assert_eq!(event.title, "No Title");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestEvent {
    /// Webhook action, e.g. `opened` or `synchronize`.
    pub action: String,
    /// Pull request number.
    pub number: u64,
    /// Pull request title.
    pub title: String,
    /// Pull request body as written by the author.
    pub description: String,
    /// `owner/repo`.
    pub repository_full_name: String,
    /// Branch the pull request merges into.
    pub base_branch: String,
    /// Branch carrying the changes.
    pub head_branch: String,
}

#[derive(Deserialize)]
struct Envelope {
    body: Option<String>,
}

#[derive(Default, Deserialize)]
struct Payload {
    action: Option<String>,
    #[serde(default)]
    pull_request: PullRequestPayload,
    #[serde(default)]
    repository: RepositoryPayload,
}

#[derive(Default, Deserialize)]
struct PullRequestPayload {
    number: Option<u64>,
    title: Option<String>,
    body: Option<String>,
    #[serde(default)]
    base: RefPayload,
    #[serde(default)]
    head: RefPayload,
}

#[derive(Default, Deserialize)]
struct RefPayload {
    #[serde(rename = "ref")]
    name: Option<String>,
}

#[derive(Default, Deserialize)]
struct RepositoryPayload {
    full_name: Option<String>,
}

const UNKNOWN: &str = "Unknown";

impl PullRequestEvent {
    /// Parse a function-style envelope `{"body": "<json string>"}`.
    ///
    /// A missing `body` is treated as an empty payload.
    ///
    /// # Errors
    ///
    /// Returns [`PrBotError::Serialization`] for invalid JSON and
    /// [`PrBotError::Parse`] when the pull request number is absent.
    pub fn from_envelope(raw: &str) -> Result<Self, PrBotError> {
        let envelope: Envelope = serde_json::from_str(raw)?;
        Self::from_payload(envelope.body.as_deref().unwrap_or("{}"))
    }

    /// Parse a raw webhook payload, filling the defaults GitHub may omit.
    ///
    /// # Errors
    ///
    /// Returns [`PrBotError::Serialization`] for invalid JSON and
    /// [`PrBotError::Parse`] when the pull request number is absent.
    pub fn from_payload(body: &str) -> Result<Self, PrBotError> {
        let payload: Payload = serde_json::from_str(body)?;
        let pr = payload.pull_request;
        let number = pr
            .number
            .ok_or_else(|| PrBotError::Parse("payload has no pull_request.number".into()))?;

        Ok(Self {
            action: payload.action.unwrap_or_else(|| UNKNOWN.into()),
            number,
            title: pr.title.unwrap_or_else(|| "No Title".into()),
            description: pr.body.unwrap_or_else(|| "No Description".into()),
            repository_full_name: payload
                .repository
                .full_name
                .unwrap_or_else(|| UNKNOWN.into()),
            base_branch: pr.base.name.unwrap_or_else(|| UNKNOWN.into()),
            head_branch: pr.head.name.unwrap_or_else(|| UNKNOWN.into()),
        })
    }
}

/// Status code and JSON-encoded message returned to the invoking boundary.
///
/// # Examples
///
/// ```
/// use prbot_core::HandlerResponse;
///
/// let response = HandlerResponse::new(200, "GitHub PR webhook processed: opened");
/// assert_eq!(response.body, "\"GitHub PR webhook processed: opened\"");
/// assert_eq!(response.message().as_deref(), Some("GitHub PR webhook processed: opened"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    /// 200, 403 or 500.
    pub status_code: u16,
    /// The message, encoded as a JSON string literal.
    pub body: String,
}

impl HandlerResponse {
    /// Build a response, JSON-encoding `message` into the body.
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            body: serde_json::Value::String(message.into()).to_string(),
        }
    }

    /// Decode the message carried in the body.
    pub fn message(&self) -> Option<String> {
        serde_json::from_str(&self.body).ok()
    }

    /// Whether the invocation reported success.
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}
