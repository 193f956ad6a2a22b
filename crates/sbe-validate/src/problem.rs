use std::fmt;

use sbe_model::Severity;
use sbe_xml::TextPosition;

/// One classified finding reported through the validation callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub severity: Severity,
    pub position: Option<TextPosition>,
    pub message: String,
}

impl Problem {
    pub fn new(severity: Severity, position: Option<TextPosition>, message: impl Into<String>) -> Self {
        Self {
            severity,
            position,
            message: message.into(),
        }
    }

    pub fn error(position: TextPosition, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, Some(position), message)
    }

    pub fn warning(position: TextPosition, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, Some(position), message)
    }

    /// Line number, or -1 when unknown.
    pub fn line(&self) -> i64 {
        self.position.map_or(-1, |position| i64::from(position.line))
    }

    /// Column number, or -1 when unknown.
    pub fn column(&self) -> i64 {
        self.position.map_or(-1, |position| i64::from(position.column))
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "[{}] {position}: {}", self.severity, self.message),
            None => write!(f, "[{}] {}", self.severity, self.message),
        }
    }
}
