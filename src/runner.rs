//! The Actions runner's side channel: step outputs and the failed status.

use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::io::{Stdout, Write};
use std::path::PathBuf;

use crate::error::{AppError, Result};

/// Where a run publishes its outputs and its failure.
pub trait ActionSink {
    /// Publish one named output value.
    fn set_output(&mut self, name: &str, value: &Value) -> Result<()>;

    /// Publish every field as an output of the same name, in order.
    /// Sinks that can stage writes should publish all of them or none.
    fn set_outputs(&mut self, fields: &Map<String, Value>) -> Result<()> {
        for (name, value) in fields {
            self.set_output(name, value)?;
        }
        Ok(())
    }

    /// Mark the run as failed with a human-readable message.
    fn set_failed(&mut self, message: &str);
}

/// Writes workflow commands and file commands the way the runner expects.
pub struct ActionsRunner<W: Write> {
    output_file: Option<PathBuf>,
    delimiter: String,
    out: W,
    failed: bool,
}

impl ActionsRunner<Stdout> {
    pub fn from_env() -> Self {
        let output_file = std::env::var("GITHUB_OUTPUT")
            .ok()
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        Self::new(output_file, std::io::stdout())
    }
}

impl<W: Write> ActionsRunner<W> {
    pub fn new(output_file: Option<PathBuf>, out: W) -> Self {
        Self {
            output_file,
            delimiter: unique_delimiter(),
            out,
            failed: false,
        }
    }

    #[cfg(test)]
    fn with_delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = delimiter.to_string();
        self
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ActionsRunner<W> {
    /// Render one output in whichever format the runner takes.
    fn stage(&self, name: &str, value: &Value) -> Result<String> {
        let value = to_command_value(value);
        match &self.output_file {
            Some(_) => file_command_entry(name, &value, &self.delimiter),
            // Legacy stdout command for runners without GITHUB_OUTPUT
            None => Ok(format!(
                "\n::set-output name={}::{}\n",
                escape_property(name),
                escape_data(&value)
            )),
        }
    }

    /// Write already-rendered outputs in a single append.
    fn commit(&mut self, staged: &str) -> Result<()> {
        if staged.is_empty() {
            return Ok(());
        }
        match &self.output_file {
            Some(path) => {
                let mut file = OpenOptions::new().append(true).create(true).open(path)?;
                file.write_all(staged.as_bytes())?;
            }
            None => self.out.write_all(staged.as_bytes())?,
        }
        Ok(())
    }
}

impl<W: Write> ActionSink for ActionsRunner<W> {
    fn set_output(&mut self, name: &str, value: &Value) -> Result<()> {
        let staged = self.stage(name, value)?;
        self.commit(&staged)
    }

    fn set_outputs(&mut self, fields: &Map<String, Value>) -> Result<()> {
        let mut staged = String::new();
        for (name, value) in fields {
            staged.push_str(&self.stage(name, value)?);
        }
        self.commit(&staged)
    }

    fn set_failed(&mut self, message: &str) {
        self.failed = true;
        if let Err(e) = writeln!(self.out, "::error::{}", escape_data(message)) {
            tracing::error!(error = %e, message, "Failed to report failure to the runner");
        }
    }
}

/// Strings go out as-is, null as empty, everything else as compact JSON.
pub fn to_command_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn unique_delimiter() -> String {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    format!("ghadelimiter_{}_{nanos}", std::process::id())
}

/// Heredoc-style entry for the GITHUB_OUTPUT file.
fn file_command_entry(name: &str, value: &str, delimiter: &str) -> Result<String> {
    if name.contains(delimiter) {
        return Err(AppError::Output(format!(
            "Unexpected input: name should not contain the delimiter \"{delimiter}\""
        )));
    }
    if value.contains(delimiter) {
        return Err(AppError::Output(format!(
            "Unexpected input: value should not contain the delimiter \"{delimiter}\""
        )));
    }
    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
}

pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
