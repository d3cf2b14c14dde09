use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChangelogError>;

#[derive(Debug, Error)]
pub enum ChangelogError {
    /// One of the two references of a diff could not be resolved.
    #[error("failed to resolve commits between `{from}` and `{to}`: {reason}")]
    RefResolution {
        from: String,
        to: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    GitHub(#[from] octocrab::Error),
}
