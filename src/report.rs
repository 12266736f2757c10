use serde_json::{Map, Value};
use std::io::Write;

use crate::error::Result;
use crate::platform::types::MergeOutcome;
use crate::runner::ActionSink;

/// Something to show in the job log.
#[derive(Debug, Clone, PartialEq)]
pub enum Printable {
    Scalar(String),
    Structured(Value),
}

impl Printable {
    /// Structured values are pretty-printed with two-space indentation,
    /// scalars verbatim.
    pub fn render(&self) -> String {
        match self {
            Printable::Scalar(s) => s.clone(),
            Printable::Structured(v) => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
        }
    }
}

impl From<&str> for Printable {
    fn from(s: &str) -> Self {
        Printable::Scalar(s.to_string())
    }
}

impl From<String> for Printable {
    fn from(s: String) -> Self {
        Printable::Scalar(s)
    }
}

impl From<Value> for Printable {
    fn from(v: Value) -> Self {
        match v {
            Value::Object(_) | Value::Array(_) => Printable::Structured(v),
            Value::String(s) => Printable::Scalar(s),
            other => Printable::Scalar(other.to_string()),
        }
    }
}

impl From<&MergeOutcome> for Printable {
    fn from(outcome: &MergeOutcome) -> Self {
        Printable::Structured(Value::Object(outcome.fields().clone()))
    }
}

/// Write the rendered message as one unprefixed line.
pub fn print_to(out: &mut impl Write, message: impl Into<Printable>) -> std::io::Result<()> {
    writeln!(out, "{}", message.into().render())
}

/// Print to the job log on stdout, independent of the tracing filter.
pub fn log_to_console(message: impl Into<Printable>) {
    if let Err(e) = print_to(&mut std::io::stdout().lock(), message) {
        tracing::warn!(error = %e, "Failed to write to stdout");
    }
}

/// Publish every top-level field as an output of the same name, in order.
/// Either every field is published or, on error, none.
pub fn set_outputs(fields: &Map<String, Value>, sink: &mut dyn ActionSink) -> Result<()> {
    sink.set_outputs(fields)
}

/// Log the merge response and republish it as step outputs.
pub fn report_outcome(outcome: &MergeOutcome, sink: &mut dyn ActionSink) -> Result<()> {
    log_to_console(outcome);
    set_outputs(outcome.fields(), sink)
}
