use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pr_automerge::config::debug_requested;
use pr_automerge::orchestrator::{
    run, ActionsEnvironment, PollOptions, RunStatus, TokioSleep, DEFAULT_MAX_RETRIES,
    DEFAULT_WAIT_SECONDS,
};
use pr_automerge::runner::ActionsRunner;

#[derive(Parser)]
#[command(
    name = "pr-automerge",
    about = "Wait for a pull request to become mergeable, then merge it"
)]
struct Cli {
    /// Path to an optional TOML file with step inputs
    #[arg(short, long)]
    config: Option<String>,

    /// How many times to check mergeability before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..))]
    max_retries: u32,

    /// Seconds to wait between checks
    #[arg(long, default_value_t = DEFAULT_WAIT_SECONDS)]
    wait_seconds: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if debug_requested(cli.config.as_deref()) {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let options = PollOptions {
        max_retries: cli.max_retries,
        wait: Duration::from_secs(cli.wait_seconds),
    };
    tracing::debug!(
        max_retries = options.max_retries,
        wait_seconds = cli.wait_seconds,
        "Starting pr-automerge"
    );

    let env = ActionsEnvironment::new(cli.config);
    let mut runner = ActionsRunner::from_env();

    match run(&env, &TokioSleep, options, &mut runner).await {
        RunStatus::Merged(outcome) => {
            tracing::info!(sha = ?outcome.sha(), merged = outcome.merged(), "Done");
        }
        RunStatus::Failed(message) => {
            tracing::debug!(%message, "Exiting with failure");
        }
    }

    if runner.failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
