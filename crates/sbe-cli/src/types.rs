use std::path::PathBuf;

use sbe_model::{SchemaVersion, ValidationResult};
use sbe_transform::PipelineReport;

/// Outcome of `convert`.
#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    pub version: SchemaVersion,
    pub report: PipelineReport,
    /// Candidate SBE message schema written by the last stage.
    pub schema: PathBuf,
    /// `None` when validation was skipped.
    pub validation: Option<ValidationResult>,
}

impl ConvertOutcome {
    /// Transforms completed and the schema, when validated, is valid.
    pub fn succeeded(&self) -> bool {
        self.validation.is_none_or(|result| result.is_valid())
    }
}

/// Outcome of `validate`.
#[derive(Debug, Clone)]
pub struct ValidateOutcome {
    pub input: PathBuf,
    pub schema: String,
    pub event_log: Option<PathBuf>,
    pub result: ValidationResult,
}
