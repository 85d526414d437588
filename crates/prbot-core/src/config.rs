use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PrBotError;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".prbot.toml";

/// Top-level configuration, built once at process start and passed by
/// reference into each client constructor.
///
/// Resolution order: defaults < `.prbot.toml` < environment variables.
///
/// # Examples
///
/// ```
/// use prbot_core::BotConfig;
///
/// let config = BotConfig::default();
/// assert_eq!(config.github.api_base_url, "https://api.github.com");
/// assert!(!config.offline);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    /// Source control settings.
    #[serde(default)]
    pub github: GitHubConfig,
    /// Language-model provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Suppress every outbound call to the source control API.
    #[serde(default)]
    pub offline: bool,
}

impl BotConfig {
    /// Load configuration from `path` (or `.prbot.toml` if it exists), then
    /// apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`PrBotError::Io`] if an explicitly requested file cannot be
    /// read, or [`PrBotError::Toml`] if the content is not valid TOML.
    pub fn load(path: Option<&Path>) -> Result<Self, PrBotError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PrBotError::Io`] if the file cannot be read, or
    /// [`PrBotError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, PrBotError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PrBotError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use prbot_core::BotConfig;
    ///
    /// let toml = r#"
    /// [llm]
    /// model = "gpt-4o-mini"
    /// "#;
    /// let config = BotConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.llm.model, "gpt-4o-mini");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PrBotError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Overlay values from an environment lookup.
    ///
    /// `TEST_MODE` turns offline mode on only for the exact value `True`;
    /// any other value turns it off. Unset variables leave the current
    /// value untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use prbot_core::BotConfig;
    ///
    /// let mut config = BotConfig::default();
    /// config.apply_env(|key| match key {
    ///     "GITHUB_ACCESS_TOKEN" => Some("ghp_test".into()),
    ///     "TEST_MODE" => Some("True".into()),
    ///     _ => None,
    /// });
    /// assert_eq!(config.github.access_token.as_deref(), Some("ghp_test"));
    /// assert!(config.offline);
    /// ```
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("GITHUB_ACCESS_TOKEN") {
            self.github.access_token = Some(token);
        }
        if let Some(url) = lookup("PRBOT_GITHUB_API_URL") {
            self.github.api_base_url = url;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = lookup("PRBOT_MODEL") {
            self.llm.model = model;
        }
        if let Some(flag) = lookup("TEST_MODE") {
            self.offline = flag == "True";
        }
    }

    /// Return the GitHub token, which is only optional in offline mode.
    ///
    /// # Errors
    ///
    /// Returns [`PrBotError::Config`] if the token is missing while online.
    pub fn github_token(&self) -> Result<&str, PrBotError> {
        match self.github.access_token.as_deref() {
            Some(token) => Ok(token),
            None if self.offline => Ok(""),
            None => Err(PrBotError::Config(
                "GITHUB_ACCESS_TOKEN not set. Set it in the environment or in .prbot.toml".into(),
            )),
        }
    }
}

/// Source control configuration.
///
/// # Examples
///
/// ```
/// use prbot_core::GitHubConfig;
///
/// let config = GitHubConfig::default();
/// assert!(config.bot_login.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API root, without trailing slash.
    #[serde(default = "default_github_api")]
    pub api_base_url: String,
    /// Access token sent as a bearer credential.
    pub access_token: Option<String>,
    /// When set, only comments authored by this login count as the bot comment.
    pub bot_login: Option<String>,
}

fn default_github_api() -> String {
    "https://api.github.com".into()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_github_api(),
            access_token: None,
            bot_login: None,
        }
    }
}

/// Language-model provider configuration.
///
/// # Examples
///
/// ```
/// use prbot_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "gpt-4o");
/// assert_eq!(config.max_output_tokens, 2000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
    /// Output token ceiling applied to every call.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_model() -> String {
    "gpt-4o".into()
}

fn default_max_output_tokens() -> u32 {
    2000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: None,
            max_output_tokens: default_max_output_tokens(),
        }
    }
}
