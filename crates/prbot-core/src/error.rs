/// Errors that can occur across prbot.
///
/// Library crates return this type directly; the binary converts to a
/// `miette` diagnostic at the boundary.
///
/// # Examples
///
/// ```
/// use prbot_core::PrBotError;
///
/// let err = PrBotError::Config("missing GITHUB_ACCESS_TOKEN".into());
/// assert!(err.to_string().contains("GITHUB_ACCESS_TOKEN"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum PrBotError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The request never produced a response (DNS, connect, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// An upstream API answered with a non-success status.
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code returned by the upstream.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// Malformed webhook payload or model output.
    #[error("parse error: {0}")]
    Parse(String),

    /// The model declined to answer.
    #[error("model refused: {0}")]
    Refusal(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
