use async_trait::async_trait;
use std::time::Duration;

use crate::config::{MergeMethod, Settings};
use crate::context::{PullRequestRef, TriggerContext};
use crate::error::{AppError, Result};
use crate::platform::github::GitHubPlatform;
use crate::platform::types::{MergeOutcome, PullRequestStatus};
use crate::platform::Platform;
use crate::report::{self, log_to_console};
use crate::runner::ActionSink;

pub const DEFAULT_MAX_RETRIES: u32 = 20;
pub const DEFAULT_WAIT_SECONDS: u64 = 5;

/// Suspends the run between poll attempts.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Real wall-clock wait.
pub struct TokioSleep;

#[async_trait]
impl Pause for TokioSleep {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Number of times mergeability is fetched before giving up.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub wait: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            wait: Duration::from_secs(DEFAULT_WAIT_SECONDS),
        }
    }
}

/// Polls a pull request until it is mergeable, then merges it.
pub struct MergeOrchestrator<'a> {
    platform: &'a dyn Platform,
    pause: &'a dyn Pause,
    options: PollOptions,
}

impl<'a> MergeOrchestrator<'a> {
    pub fn new(platform: &'a dyn Platform, pause: &'a dyn Pause, options: PollOptions) -> Self {
        Self {
            platform,
            pause,
            options,
        }
    }

    /// Fetch mergeability up to `max_retries` times with a fixed wait in
    /// between. Only a not-yet-mergeable answer is retried; API errors
    /// propagate immediately.
    pub async fn wait_until_mergeable(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<PullRequestStatus> {
        let max_retries = self.options.max_retries;

        for attempt in 1..=max_retries {
            let status = self
                .platform
                .get_pull_request(owner, repo, pr_number)
                .await?;

            if status.is_mergeable() {
                tracing::info!(owner, repo, pr_number, attempt, "Pull request is mergeable");
                return Ok(status);
            }

            if attempt == max_retries {
                break;
            }

            tracing::debug!(
                pr_number,
                attempt,
                mergeable_state = ?status.mergeable_state,
                "Pull request not mergeable yet"
            );
            log_to_console(format!(
                "Pull request is not mergeable. Retrying in {} seconds... ({attempt}/{max_retries})",
                self.options.wait.as_secs_f64()
            ));
            self.pause.pause(self.options.wait).await;
        }

        Err(AppError::NotMergeable)
    }

    /// Wait for the pull request to become mergeable and merge it.
    pub async fn merge_when_ready(
        &self,
        pr: &PullRequestRef,
        method: MergeMethod,
    ) -> Result<MergeOutcome> {
        let pr_number = pr.number.ok_or(AppError::PullRequestNotFound)?;

        self.wait_until_mergeable(&pr.owner, &pr.repo, pr_number)
            .await?;

        tracing::info!(pr_number, %method, "Merging pull request");
        self.platform
            .merge_pull_request(&pr.owner, &pr.repo, pr_number, method)
            .await
    }
}

/// Supplies a run's inputs, trigger context and API client.
pub trait Environment {
    fn settings(&self) -> Result<Settings>;

    fn pull_request(&self) -> Result<PullRequestRef>;

    fn connect(&self, settings: &Settings) -> Result<Box<dyn Platform>>;
}

/// The GitHub Actions runner: `INPUT_*` variables, the event payload and
/// a token-authenticated octocrab client.
#[derive(Debug, Default)]
pub struct ActionsEnvironment {
    config_path: Option<String>,
}

impl ActionsEnvironment {
    pub fn new(config_path: Option<String>) -> Self {
        Self { config_path }
    }
}

impl Environment for ActionsEnvironment {
    fn settings(&self) -> Result<Settings> {
        Settings::load(self.config_path.as_deref())
    }

    fn pull_request(&self) -> Result<PullRequestRef> {
        TriggerContext::from_env()?.pull_request()
    }

    fn connect(&self, settings: &Settings) -> Result<Box<dyn Platform>> {
        Ok(Box::new(GitHubPlatform::from_env(&settings.github_token)?))
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Merged(MergeOutcome),
    Failed(String),
}

/// Entry point for one run. Every failure ends up here and is reported to
/// the sink exactly once; outputs are published only on success.
pub async fn run(
    env: &dyn Environment,
    pause: &dyn Pause,
    options: PollOptions,
    sink: &mut dyn ActionSink,
) -> RunStatus {
    match try_run(env, pause, options, sink).await {
        Ok(outcome) => RunStatus::Merged(outcome),
        Err(e) => {
            let message = e.to_string();
            tracing::debug!(error = ?e, "Run failed");
            sink.set_failed(&message);
            RunStatus::Failed(message)
        }
    }
}

async fn try_run(
    env: &dyn Environment,
    pause: &dyn Pause,
    options: PollOptions,
    sink: &mut dyn ActionSink,
) -> Result<MergeOutcome> {
    let settings = env.settings()?;
    tracing::info!(
        merge_method = %settings.merge_method,
        debug = settings.debug,
        "Resolved inputs"
    );

    tracing::debug!("Getting Pull request info");
    let pr = env.pull_request()?;
    tracing::debug!(owner = %pr.owner, repo = %pr.repo, pr_number = ?pr.number, "Done");

    if pr.number.is_none() {
        return Err(AppError::PullRequestNotFound);
    }

    tracing::debug!("Authenticating with GitHub...");
    let platform = env.connect(&settings)?;
    tracing::debug!("Done");

    let orchestrator = MergeOrchestrator::new(platform.as_ref(), pause, options);
    let outcome = orchestrator
        .merge_when_ready(&pr, settings.merge_method)
        .await?;

    report::report_outcome(&outcome, sink)?;
    Ok(outcome)
}
