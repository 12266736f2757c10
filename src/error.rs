use thiserror::Error;

/// Every failure a run can end with.
///
/// Display strings are what ends up in the `::error::` annotation, so the
/// wrapped messages are rendered verbatim.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Config(String),

    #[error("Could not find pull request. Skipping...")]
    PullRequestNotFound,

    #[error("Pull request is not mergeable.")]
    NotMergeable,

    #[error("{0}")]
    GitHubApi(String),

    #[error("{0}")]
    Output(String),

    #[error("{0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl From<octocrab::Error> for AppError {
    fn from(e: octocrab::Error) -> Self {
        match e {
            // The variant itself displays as just "GitHub"
            octocrab::Error::GitHub { source, .. } => AppError::GitHubApi(source.message),
            other => AppError::GitHubApi(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
