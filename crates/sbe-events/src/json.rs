//! Newline-delimited JSON event log.
//!
//! Each record is written as one standalone JSON object followed by `\n`,
//! so a reader can parse any line without looking at its neighbours.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use sbe_model::{EventArg, EventRecord, Severity};

use crate::EventSink;
use crate::error::EventError;

/// Line format of the structured event log.
#[derive(Debug, Serialize)]
struct JsonLine<'a> {
    timestamp: String,
    severity: Severity,
    message: String,
    template: &'a str,
    args: &'a [EventArg],
}

/// A record read back from an event log.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggedEvent {
    pub timestamp: String,
    pub severity: Severity,
    pub message: String,
    pub template: String,
    #[serde(default)]
    pub args: Vec<EventArg>,
}

pub struct JsonSink<W: Write = BufWriter<File>> {
    writer: Option<W>,
    write_failed: bool,
}

impl JsonSink<BufWriter<File>> {
    /// Create (or truncate) the event log at `path`.
    pub fn create(path: &Path) -> Result<Self, EventError> {
        let file = File::create(path).map_err(|source| EventError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write> JsonSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: Some(writer),
            write_failed: false,
        }
    }

    /// Flush and return the underlying writer, if the sink is still open.
    pub fn into_inner(mut self) -> Option<W> {
        let mut writer = self.writer.take()?;
        let _ = writer.flush();
        Some(writer)
    }

    fn write_record(writer: &mut W, record: &EventRecord) -> std::io::Result<()> {
        let line = JsonLine {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            severity: record.severity,
            message: record.message(),
            template: &record.template,
            args: &record.args,
        };
        serde_json::to_writer(&mut *writer, &line)?;
        writer.write_all(b"\n")
    }
}

impl<W: Write> EventSink for JsonSink<W> {
    fn log(&mut self, record: &EventRecord) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        if let Err(error) = Self::write_record(writer, record)
            && !self.write_failed
        {
            // Report the first failure only; later records would fail the same way.
            self.write_failed = true;
            warn!(%error, "failed to write event record");
        }
    }

    fn close(&mut self) -> Result<(), EventError> {
        match self.writer.take() {
            Some(mut writer) => writer.flush().map_err(|source| EventError::Flush { source }),
            None => Ok(()),
        }
    }
}

/// Read every record of a newline-delimited JSON event log.
pub fn read_event_log(path: &Path) -> Result<Vec<LoggedEvent>, EventError> {
    let file = File::open(path).map_err(|source| EventError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut events = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| EventError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| EventError::Parse {
            line: index + 1,
            source,
        })?;
        events.push(event);
    }
    Ok(events)
}
