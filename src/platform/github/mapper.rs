use serde_json::Value;

use crate::error::{AppError, Result};
use crate::platform::types;

/// Map octocrab PullRequest to our mergeability snapshot.
pub fn map_pull_request_status(pr: &octocrab::models::pulls::PullRequest) -> types::PullRequestStatus {
    types::PullRequestStatus {
        number: pr.number,
        mergeable: pr.mergeable,
        mergeable_state: pr
            .mergeable_state
            .as_ref()
            .and_then(|state| serde_json::to_value(state).ok())
            .and_then(|v| v.as_str().map(str::to_string)),
    }
}

/// The merge endpoint answers with a flat object; anything else is a protocol error.
pub fn map_merge_response(response: Value) -> Result<types::MergeOutcome> {
    match response {
        Value::Object(fields) => Ok(types::MergeOutcome::new(fields)),
        other => Err(AppError::GitHubApi(format!(
            "Unexpected merge response: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_merge_response_keeps_every_field() {
        let outcome = map_merge_response(json!({
            "sha": "abc123",
            "merged": true,
            "message": "Pull Request successfully merged"
        }))
        .unwrap();

        assert_eq!(outcome.sha(), Some("abc123"));
        assert!(outcome.merged());
        assert_eq!(outcome.fields().len(), 3);
    }

    #[test]
    fn test_map_merge_response_rejects_non_object() {
        let err = map_merge_response(json!(["merged"])).unwrap_err();
        assert!(matches!(err, AppError::GitHubApi(_)));
        assert!(err.to_string().starts_with("Unexpected merge response"));
    }
}
