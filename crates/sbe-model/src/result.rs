use serde::{Deserialize, Serialize};

use crate::event::Severity;

/// Per-severity counts of a single validation run.
///
/// Counts only ever increase through [`ValidationResult::record`]; a fresh
/// value is created for every run. The verdict is derived from the counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: usize,
    fatal_errors: usize,
    warnings: usize,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one problem of the given severity. Informational events are not counted.
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Info => {}
            Severity::Warning => self.warnings += 1,
            Severity::Error => self.errors += 1,
            Severity::Fatal => self.fatal_errors += 1,
        }
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn fatal_errors(&self) -> usize {
        self.fatal_errors
    }

    pub fn warnings(&self) -> usize {
        self.warnings
    }

    /// `true` iff there are no errors and no fatal errors.
    pub fn is_valid(&self) -> bool {
        self.errors + self.fatal_errors == 0
    }

    /// Severity of the summary event closing a run.
    pub fn summary_severity(&self) -> Severity {
        if self.is_valid() {
            Severity::Info
        } else {
            Severity::Fatal
        }
    }
}
