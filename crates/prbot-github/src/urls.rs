/// Builds REST endpoint URLs for one GitHub API root.
///
/// # Examples
///
/// ```
/// use prbot_github::GitHubUrls;
///
/// let urls = GitHubUrls::default();
/// assert_eq!(
///     urls.compare("octocat/hello", "main", "feature"),
///     "https://api.github.com/repos/octocat/hello/compare/main...feature"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubUrls {
    base: String,
}

impl Default for GitHubUrls {
    fn default() -> Self {
        Self::new("https://api.github.com")
    }
}

impl GitHubUrls {
    /// Create a builder rooted at `base`; a trailing slash is ignored.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// `GET` target used to check that the token can see the repository.
    pub fn repository(&self, full_name: &str) -> String {
        format!("{}/repos/{full_name}", self.base)
    }

    /// Collection of issue comments on a pull request.
    pub fn comments(&self, full_name: &str, pr_number: u64) -> String {
        format!("{}/repos/{full_name}/issues/{pr_number}/comments", self.base)
    }

    /// A single issue comment.
    pub fn comment(&self, full_name: &str, comment_id: u64) -> String {
        format!("{}/repos/{full_name}/issues/comments/{comment_id}", self.base)
    }

    /// Three-dot comparison between two branches.
    pub fn compare(&self, full_name: &str, base_branch: &str, head_branch: &str) -> String {
        format!(
            "{}/repos/{full_name}/compare/{base_branch}...{head_branch}",
            self.base
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_url() {
        let urls = GitHubUrls::default();
        assert_eq!(
            urls.repository("user/sample-repo"),
            "https://api.github.com/repos/user/sample-repo"
        );
    }

    #[test]
    fn comments_url() {
        let urls = GitHubUrls::default();
        assert_eq!(
            urls.comments("user/sample-repo", 1),
            "https://api.github.com/repos/user/sample-repo/issues/1/comments"
        );
    }

    #[test]
    fn comment_url_is_not_scoped_to_pr() {
        let urls = GitHubUrls::default();
        assert_eq!(
            urls.comment("user/sample-repo", 42),
            "https://api.github.com/repos/user/sample-repo/issues/comments/42"
        );
    }

    #[test]
    fn custom_base_drops_trailing_slash() {
        let urls = GitHubUrls::new("http://127.0.0.1:8080/");
        assert_eq!(
            urls.compare("o/r", "main", "feature/x"),
            "http://127.0.0.1:8080/repos/o/r/compare/main...feature/x"
        );
    }
}
