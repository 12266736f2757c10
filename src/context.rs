use serde::Deserialize;
use std::path::Path;

use crate::error::{AppError, Result};

/// Repository coordinates and, when the run was triggered by one, the pull
/// request number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: Option<u64>,
}

/// The slice of the triggering event payload this tool cares about.
#[derive(Debug, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub pull_request: Option<PullRequestPayload>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestPayload {
    #[serde(default)]
    pub number: Option<u64>,
}

/// What the runner tells a step about the workflow run that invoked it.
#[derive(Debug)]
pub struct TriggerContext {
    pub repository: Option<String>,
    pub payload: EventPayload,
}

impl TriggerContext {
    /// Read `GITHUB_REPOSITORY` and the payload at `GITHUB_EVENT_PATH`.
    pub fn from_env() -> Result<Self> {
        let repository = std::env::var("GITHUB_REPOSITORY").ok();
        let payload = match std::env::var("GITHUB_EVENT_PATH") {
            Ok(path) if !path.is_empty() => load_payload(Path::new(&path))?,
            _ => EventPayload::default(),
        };
        Ok(Self { repository, payload })
    }

    /// Derive the pull request reference. A missing pull request is not an
    /// error here; the caller decides what to do with it.
    pub fn pull_request(&self) -> Result<PullRequestRef> {
        let (owner, repo) = parse_repository(self.repository.as_deref())?;
        Ok(PullRequestRef {
            owner: owner.to_string(),
            repo: repo.to_string(),
            number: self.payload.pull_request.as_ref().and_then(|pr| pr.number),
        })
    }
}

fn load_payload(path: &Path) -> Result<EventPayload> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "GITHUB_EVENT_PATH does not exist");
        return Ok(EventPayload::default());
    }
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn parse_repository(repository: Option<&str>) -> Result<(&str, &str)> {
    let missing = || {
        AppError::Config(
            "context.repo requires a GITHUB_REPOSITORY environment variable like 'owner/repo'"
                .to_string(),
        )
    };
    let parts: Vec<&str> = repository.ok_or_else(missing)?.splitn(2, '/').collect();
    match parts.as_slice() {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() => Ok((*owner, *repo)),
        _ => Err(missing()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn context(repository: &str, payload: &str) -> TriggerContext {
        TriggerContext {
            repository: Some(repository.to_string()),
            payload: serde_json::from_str(payload).unwrap(),
        }
    }

    #[test]
    fn test_pull_request_event() {
        let ctx = context("owner/repo", r#"{"action":"opened","pull_request":{"number":123}}"#);
        assert_eq!(
            ctx.pull_request().unwrap(),
            PullRequestRef {
                owner: "owner".to_string(),
                repo: "repo".to_string(),
                number: Some(123),
            }
        );
    }

    #[test]
    fn test_event_without_pull_request() {
        let ctx = context("owner/repo", r#"{"workflow":"ci.yml","ref":"refs/heads/main"}"#);
        let pr = ctx.pull_request().unwrap();
        assert_eq!(pr.owner, "owner");
        assert_eq!(pr.repo, "repo");
        assert_eq!(pr.number, None);
    }

    #[test]
    fn test_pull_request_without_number() {
        let ctx = context("owner/repo", r#"{"pull_request":{"title":"Draft"}}"#);
        assert_eq!(ctx.pull_request().unwrap().number, None);

        let ctx = context("owner/repo", r#"{"pull_request":{"number":null}}"#);
        assert_eq!(ctx.pull_request().unwrap().number, None);
    }

    #[test]
    fn test_missing_repository() {
        let ctx = TriggerContext {
            repository: None,
            payload: EventPayload::default(),
        };
        let err = ctx.pull_request().unwrap_err();
        assert!(err.to_string().contains("GITHUB_REPOSITORY"));

        for bad in ["", "owner", "owner/", "/repo"] {
            assert!(context(bad, "{}").pull_request().is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_load_payload_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pull_request":{{"number":7,"title":"Bump deps"}}}}"#).unwrap();

        let payload = load_payload(file.path()).unwrap();
        assert_eq!(payload.pull_request.and_then(|pr| pr.number), Some(7));
    }

    #[test]
    fn test_load_payload_missing_file_is_empty() {
        let payload = load_payload(Path::new("/nonexistent/event.json")).unwrap();
        assert!(payload.pull_request.is_none());
    }

    #[test]
    fn test_load_payload_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            load_payload(file.path()),
            Err(AppError::Serialization(_))
        ));
    }
}
