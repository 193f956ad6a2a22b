use std::path::PathBuf;

use thiserror::Error;

use crate::registry::SinkKind;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("failed to create event log {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to flush event log: {source}")]
    Flush {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read event log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid event record at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown event sink kind: {name}")]
    UnknownKind { name: String },

    #[error("event sink {kind} requires a destination")]
    MissingDestination { kind: SinkKind },
}
