use prbot_core::PrBotError;
use serde::Deserialize;

use crate::llm::ResponseSchema;

const SUMMARY_PROMPT: &str = "\
Summarize the following git changeset as a pull request description. \
Be concise: state what changed and why it matters to a reviewer, in a few \
sentences or a short bullet list. Use markdown. Do not review the code.";

const CRITIQUE_PROMPT: &str = "\
You are an experienced software engineer familiar with leading practices in \
security, observability, reliability, object-oriented design, functional \
programming, and performance.
Review the following git diff, focusing only on the lines that were added. \
Point out logic errors and general mistakes, inconsistent naming, missing \
types where the language supports them, and non-RESTful API design where it \
applies. Keep each remark brief and format the review as markdown. Suggest \
code changes when they help, but do not comment on code that is acceptable. \
If there is nothing to improve, write a short encouraging note to the developer.
If the pull request description is missing or unknown, summarize the changes \
yourself and include a 'Pull Request Description' section in the review.
Do not comment on:
- using a logging library
- deployment configuration changes";

/// Build the prompt asking for a pull request summary.
///
/// # Examples
///
/// ```
/// use prbot_review::prompt::build_summary_prompt;
///
/// let prompt = build_summary_prompt("File: a.py\nChanges:\n+pass");
/// assert!(prompt.contains("+pass"));
/// ```
pub fn build_summary_prompt(changeset: &str) -> String {
    format!("{SUMMARY_PROMPT}\n\n### Code Changes Begin:\n{changeset}\n### Code Changes End")
}

/// Build the prompt asking for review feedback on the added lines.
///
/// # Examples
///
/// ```
/// use prbot_review::prompt::build_critique_prompt;
///
/// let prompt = build_critique_prompt("Add a.py", "Adds a.py", "+pass");
/// assert!(prompt.contains("Pull Request Title: Add a.py"));
/// assert!(prompt.contains("Adds a.py"));
/// ```
pub fn build_critique_prompt(title: &str, description: &str, changeset: &str) -> String {
    format!(
        "{CRITIQUE_PROMPT}\n\n\
         Pull Request Title: {title}\n\n\
         Pull Request Description:\n{description}\n\n\
         ### Code Changes Begin:\n{changeset}\n### Code Changes End"
    )
}

/// Schema for the summary call: exactly one string field.
pub fn summary_schema() -> ResponseSchema {
    ResponseSchema {
        name: "pull_request_summary".into(),
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "pullRequestDescription": { "type": "string" }
            },
            "required": ["pullRequestDescription"],
            "additionalProperties": false,
        }),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    pull_request_description: String,
}

/// Extract the description from the summary call's JSON reply.
///
/// Handles markdown code fences around JSON.
///
/// # Errors
///
/// Returns [`PrBotError::Parse`] if the reply does not match the schema.
///
/// # Examples
///
/// ```
/// use prbot_review::prompt::parse_summary_response;
///
/// let text = parse_summary_response(r#"{"pullRequestDescription":"Adds a.py"}"#).unwrap();
/// assert_eq!(text, "Adds a.py");
/// ```
pub fn parse_summary_response(response: &str) -> Result<String, PrBotError> {
    let cleaned = strip_code_fences(response);
    let parsed: SummaryResponse = serde_json::from_str(cleaned)
        .map_err(|e| PrBotError::Parse(format!("summary does not match schema: {e}")))?;
    Ok(parsed.pull_request_description)
}

fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}
