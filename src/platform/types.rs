use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One poll of a pull request's mergeability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestStatus {
    pub number: u64,
    /// `None` while GitHub is still computing it.
    pub mergeable: Option<bool>,
    /// clean, dirty, unknown, blocked, ... Informational only.
    pub mergeable_state: Option<String>,
}

impl PullRequestStatus {
    pub fn is_mergeable(&self) -> bool {
        self.mergeable == Some(true)
    }
}

/// The merge response, with every top-level property in the order GitHub
/// sent it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergeOutcome(Map<String, Value>);

impl MergeOutcome {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn sha(&self) -> Option<&str> {
        self.0.get("sha").and_then(Value::as_str)
    }

    pub fn merged(&self) -> bool {
        self.0.get("merged").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for MergeOutcome {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
