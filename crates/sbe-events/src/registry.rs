//! The fixed set of sink kinds a [`crate::TeeSink`] can be built from.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::Dispatch;

use crate::EventSink;
use crate::error::EventError;
use crate::json::JsonSink;
use crate::log::LogSink;
use crate::memory::MemorySink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    /// Human-readable log through `tracing`.
    Log,
    /// Newline-delimited JSON records written to a file.
    Json,
    /// In-memory collection.
    Memory,
}

impl SinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SinkKind::Log => "LOG",
            SinkKind::Json => "JSON",
            SinkKind::Memory => "MEMORY",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkKind {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOG" | "TEXT" => Ok(SinkKind::Log),
            "JSON" => Ok(SinkKind::Json),
            "MEMORY" => Ok(SinkKind::Memory),
            _ => Err(EventError::UnknownKind {
                name: s.to_string(),
            }),
        }
    }
}

/// Configuration for one child of a tee.
#[derive(Clone)]
pub enum SinkSpec {
    Log(Dispatch),
    Json(PathBuf),
    Memory(MemorySink),
}

impl SinkSpec {
    /// Build a spec from a kind name and an optional destination path.
    ///
    /// `LOG` uses the current default dispatcher; `JSON` requires a destination.
    pub fn from_name(name: &str, destination: Option<PathBuf>) -> Result<Self, EventError> {
        let kind: SinkKind = name.parse()?;
        match kind {
            SinkKind::Log => Ok(SinkSpec::Log(tracing::dispatcher::get_default(
                Dispatch::clone,
            ))),
            SinkKind::Json => destination
                .map(SinkSpec::Json)
                .ok_or(EventError::MissingDestination { kind }),
            SinkKind::Memory => Ok(SinkSpec::Memory(MemorySink::new())),
        }
    }

    pub fn kind(&self) -> SinkKind {
        match self {
            SinkSpec::Log(_) => SinkKind::Log,
            SinkSpec::Json(_) => SinkKind::Json,
            SinkSpec::Memory(_) => SinkKind::Memory,
        }
    }

    /// Open the destination.
    pub fn open(self) -> Result<Box<dyn EventSink>, EventError> {
        match self {
            SinkSpec::Log(dispatch) => Ok(Box::new(LogSink::new(dispatch))),
            SinkSpec::Json(path) => Ok(Box::new(JsonSink::create(&path)?)),
            SinkSpec::Memory(sink) => Ok(Box::new(sink)),
        }
    }
}

impl fmt::Debug for SinkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkSpec::Log(_) => f.write_str("Log"),
            SinkSpec::Json(path) => f.debug_tuple("Json").field(path).finish(),
            SinkSpec::Memory(_) => f.write_str("Memory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_names() {
        assert_eq!("json".parse::<SinkKind>().ok(), Some(SinkKind::Json));
        assert_eq!(" text ".parse::<SinkKind>().ok(), Some(SinkKind::Log));
        assert!(matches!(
            "xml".parse::<SinkKind>(),
            Err(EventError::UnknownKind { .. })
        ));
    }

    #[test]
    fn json_spec_requires_destination() {
        assert!(matches!(
            SinkSpec::from_name("JSON", None),
            Err(EventError::MissingDestination {
                kind: SinkKind::Json
            })
        ));
        let spec = SinkSpec::from_name("JSON", Some(PathBuf::from("events.json")))
            .expect("json spec");
        assert_eq!(spec.kind(), SinkKind::Json);
    }
}
