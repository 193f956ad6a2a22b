//! Event records emitted during a validation run.
//!
//! An [`EventRecord`] is a self-contained value: a severity, a message
//! template with positional placeholders (`{0}`, `{1,number,integer}`) and
//! the arguments that fill them. Sinks receive records by reference and may
//! render or serialize them independently of one another.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::template::render_template;

/// Event severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// Errors and fatal errors fail a validation run; warnings never do.
    pub fn fails_validation(self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positional argument of an event message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventArg {
    Integer(i64),
    Text(String),
}

impl fmt::Display for EventArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventArg::Integer(value) => write!(f, "{value}"),
            EventArg::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for EventArg {
    fn from(value: i64) -> Self {
        EventArg::Integer(value)
    }
}

impl From<i32> for EventArg {
    fn from(value: i32) -> Self {
        EventArg::Integer(i64::from(value))
    }
}

impl From<u32> for EventArg {
    fn from(value: u32) -> Self {
        EventArg::Integer(i64::from(value))
    }
}

impl From<usize> for EventArg {
    fn from(value: usize) -> Self {
        EventArg::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for EventArg {
    fn from(value: &str) -> Self {
        EventArg::Text(value.to_string())
    }
}

impl From<String> for EventArg {
    fn from(value: String) -> Self {
        EventArg::Text(value)
    }
}

impl From<&String> for EventArg {
    fn from(value: &String) -> Self {
        EventArg::Text(value.clone())
    }
}

/// A single reported event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub severity: Severity,
    pub template: String,
    #[serde(default)]
    pub args: Vec<EventArg>,
}

impl EventRecord {
    pub fn new(severity: Severity, template: impl Into<String>, args: Vec<EventArg>) -> Self {
        Self {
            severity,
            template: template.into(),
            args,
        }
    }

    pub fn info(template: impl Into<String>, args: Vec<EventArg>) -> Self {
        Self::new(Severity::Info, template, args)
    }

    pub fn warning(template: impl Into<String>, args: Vec<EventArg>) -> Self {
        Self::new(Severity::Warning, template, args)
    }

    pub fn error(template: impl Into<String>, args: Vec<EventArg>) -> Self {
        Self::new(Severity::Error, template, args)
    }

    pub fn fatal(template: impl Into<String>, args: Vec<EventArg>) -> Self {
        Self::new(Severity::Fatal, template, args)
    }

    /// Render the template with its arguments.
    pub fn message(&self) -> String {
        render_template(&self.template, &self.args)
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message())
    }
}
