pub mod github;
pub mod types;

use async_trait::async_trait;

use crate::config::MergeMethod;
use crate::error::Result;
use types::*;

/// The two source-control operations a run needs.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Fetch a pull request's current mergeability.
    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<PullRequestStatus>;

    /// Merge a pull request with the given method.
    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        method: MergeMethod,
    ) -> Result<MergeOutcome>;
}
