use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Prefix the Actions runner puts in front of every step input.
const INPUT_ENV_PREFIX: &str = "INPUT";

const TRUE_VALUES: [&str; 3] = ["true", "True", "TRUE"];
const FALSE_VALUES: [&str; 3] = ["false", "False", "FALSE"];

/// Strategy used to integrate a pull request's commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMethod {
    Merge,
    #[default]
    Squash,
    Rebase,
}

impl MergeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeMethod::Merge => "merge",
            MergeMethod::Squash => "squash",
            MergeMethod::Rebase => "rebase",
        }
    }
}

impl fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "merge" => Ok(MergeMethod::Merge),
            "squash" => Ok(MergeMethod::Squash),
            "rebase" => Ok(MergeMethod::Rebase),
            other => Err(AppError::Config(format!("Invalid merge method: {other}"))),
        }
    }
}

/// Step inputs exactly as supplied, before validation.
#[derive(Deserialize, Default, Clone)]
pub struct RawInputs {
    #[serde(rename = "github-token", default)]
    pub github_token: Option<String>,
    #[serde(rename = "merge-method", default)]
    pub merge_method: Option<String>,
    #[serde(default)]
    pub debug: Option<String>,
}

// Manual Debug impl to avoid leaking the token
impl fmt::Debug for RawInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawInputs")
            .field("github_token", &self.github_token.as_ref().map(|_| "[REDACTED]"))
            .field("merge_method", &self.merge_method)
            .field("debug", &self.debug)
            .finish()
    }
}

impl RawInputs {
    /// Layer an optional TOML file under the runner's `INPUT_*` variables.
    ///
    /// `env` replaces the process environment when given.
    pub fn load(
        config_path: Option<&str>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("automerge").required(false));
        }

        // INPUT_GITHUB-TOKEN -> "github-token"
        builder = builder.add_source(
            config::Environment::with_prefix(INPUT_ENV_PREFIX)
                .prefix_separator("_")
                .source(env),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Lenient read of `debug`; an invalid spelling counts as off here.
    pub fn debug_enabled(&self) -> bool {
        parse_bool_input("debug", trimmed(self.debug.as_deref())).unwrap_or(false)
    }
}

/// Validated configuration for one run.
#[derive(Clone)]
pub struct Settings {
    pub github_token: String,
    pub merge_method: MergeMethod,
    pub debug: bool,
}

// Manual Debug impl to avoid leaking the token
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("github_token", &"[REDACTED]")
            .field("merge_method", &self.merge_method)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Settings {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::from_raw(RawInputs::load(config_path, None)?)
    }

    /// Validate raw inputs. The token is checked first so a missing token is
    /// reported no matter what else is wrong.
    pub fn from_raw(raw: RawInputs) -> Result<Self> {
        let github_token = trimmed(raw.github_token.as_deref());
        if github_token.is_empty() {
            return Err(AppError::Config("github-token is required".to_string()));
        }

        let method_input = trimmed(raw.merge_method.as_deref());
        let merge_method = if method_input.is_empty() {
            MergeMethod::default()
        } else {
            method_input.parse::<MergeMethod>()?
        };

        let debug = parse_bool_input("debug", trimmed(raw.debug.as_deref()))?;

        Ok(Self {
            github_token: github_token.to_string(),
            merge_method,
            debug,
        })
    }
}

fn trimmed(value: Option<&str>) -> &str {
    value.map(str::trim).unwrap_or_default()
}

/// Boolean input in the YAML 1.2 core schema spelling the runner accepts.
/// An empty value means the input was not set.
pub fn parse_bool_input(name: &str, value: &str) -> Result<bool> {
    if value.is_empty() || FALSE_VALUES.contains(&value) {
        return Ok(false);
    }
    if TRUE_VALUES.contains(&value) {
        return Ok(true);
    }
    Err(AppError::Config(format!(
        "Input does not meet YAML 1.2 \"Core Schema\" specification: {name}\n\
         Support boolean input list: `true | True | TRUE | false | False | FALSE`"
    )))
}

/// Whether verbose logging was asked for, either through the `debug` input
/// (file or environment) or by re-running the job with debug logging enabled.
/// Never fails: bad inputs are reported later by [`Settings::from_raw`].
pub fn debug_requested(config_path: Option<&str>) -> bool {
    let from_inputs = RawInputs::load(config_path, None)
        .map(|raw| raw.debug_enabled())
        .unwrap_or(false);
    from_inputs || std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1")
}
