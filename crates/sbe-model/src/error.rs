use thiserror::Error;

/// Returned when a schema version label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown SBE schema version: {label} (expected v1 or v2)")]
pub struct UnknownSchemaVersion {
    pub label: String,
}
