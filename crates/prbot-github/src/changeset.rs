//! Flattening of a branch comparison into the text sent to the model.

use prbot_core::{Changeset, FileChange};
use serde::Deserialize;

/// Body of `GET /repos/{repo}/compare/{base}...{head}`, reduced to the
/// fields the reviewer reads.
#[derive(Debug, Default, Deserialize)]
pub struct CompareResponse {
    #[serde(default)]
    files: Vec<CompareFile>,
    #[serde(default)]
    commits: Vec<CompareCommit>,
}

#[derive(Debug, Deserialize)]
struct CompareFile {
    filename: Option<String>,
    patch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompareCommit {
    #[serde(default)]
    commit: CommitDetail,
}

#[derive(Debug, Default, Deserialize)]
struct CommitDetail {
    message: Option<String>,
}

impl From<CompareResponse> for Changeset {
    fn from(response: CompareResponse) -> Self {
        let files = response
            .files
            .into_iter()
            .map(|f| FileChange {
                filename: f.filename.unwrap_or_else(|| "Unknown file".into()),
                patch: f.patch.unwrap_or_default(),
            })
            .collect();
        let commit_messages = response
            .commits
            .into_iter()
            .map(|c| c.commit.message.unwrap_or_default())
            .collect();
        Changeset {
            files,
            commit_messages,
        }
    }
}

/// Render a changeset as one text blob.
///
/// Each file becomes `File: <name>\nChanges:\n<patch>\n`; file blocks are
/// joined by a newline and followed by a `Commit Messages:` section.
///
/// # Examples
///
/// ```
/// use prbot_core::{Changeset, FileChange};
/// use prbot_github::format_changeset;
///
/// let changeset = Changeset {
///     files: vec![FileChange { filename: "a.py".into(), patch: "+pass".into() }],
///     commit_messages: vec!["add a.py".into()],
/// };
/// assert_eq!(
///     format_changeset(&changeset),
///     "File: a.py\nChanges:\n+pass\n\nCommit Messages:\nadd a.py"
/// );
/// ```
pub fn format_changeset(changeset: &Changeset) -> String {
    let files: Vec<String> = changeset
        .files
        .iter()
        .map(|f| format!("File: {}\nChanges:\n{}\n", f.filename, f.patch))
        .collect();
    format!(
        "{}\nCommit Messages:\n{}",
        files.join("\n"),
        changeset.commit_messages.join("\n")
    )
}
