//! Composite sink fanning every record out to its children.

use tracing::{debug, warn};

use sbe_model::{EventArg, EventRecord, Severity};

use crate::EventSink;
use crate::error::EventError;
use crate::registry::SinkSpec;

/// Ordered collection of sinks.
///
/// Records are forwarded to every child in registration order. The tee is
/// closed explicitly with [`TeeSink::close`] or, failing that, on drop;
/// child close failures are traced and swallowed.
#[derive(Default)]
pub struct TeeSink {
    sinks: Vec<Box<dyn EventSink>>,
    closed: bool,
}

impl TeeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open every spec, skipping (and tracing) the ones that fail.
    pub fn from_specs(specs: impl IntoIterator<Item = SinkSpec>) -> Self {
        let mut tee = Self::new();
        tee.add_specs(specs);
        tee
    }

    /// Open and append every spec; a spec that fails to open is traced
    /// and skipped, the others still join.
    pub fn add_specs(&mut self, specs: impl IntoIterator<Item = SinkSpec>) -> &mut Self {
        for spec in specs {
            let kind = spec.kind();
            match spec.open() {
                Ok(sink) => self.sinks.push(sink),
                Err(error) => warn!(%kind, %error, "skipping event sink"),
            }
        }
        self
    }

    pub fn add(&mut self, sink: impl EventSink + 'static) -> &mut Self {
        self.sinks.push(Box::new(sink));
        self
    }

    #[must_use]
    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.add(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn emit(&mut self, severity: Severity, template: &str, args: Vec<EventArg>) {
        self.log(&EventRecord::new(severity, template, args));
    }

    pub fn info(&mut self, template: &str, args: Vec<EventArg>) {
        self.emit(Severity::Info, template, args);
    }

    pub fn warn(&mut self, template: &str, args: Vec<EventArg>) {
        self.emit(Severity::Warning, template, args);
    }

    pub fn error(&mut self, template: &str, args: Vec<EventArg>) {
        self.emit(Severity::Error, template, args);
    }

    pub fn fatal(&mut self, template: &str, args: Vec<EventArg>) {
        self.emit(Severity::Fatal, template, args);
    }

    /// Close every child. Later records are dropped.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for (index, sink) in self.sinks.iter_mut().enumerate() {
            if let Err(error) = sink.close() {
                warn!(index, %error, "failed to close event sink");
            }
        }
        debug!(sinks = self.sinks.len(), "event sinks closed");
    }
}

impl EventSink for TeeSink {
    fn log(&mut self, record: &EventRecord) {
        if self.closed {
            return;
        }
        for sink in &mut self.sinks {
            sink.log(record);
        }
    }

    fn close(&mut self) -> Result<(), EventError> {
        TeeSink::close(self);
        Ok(())
    }
}

impl Drop for TeeSink {
    fn drop(&mut self) {
        TeeSink::close(self);
    }
}

impl std::fmt::Debug for TeeSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeeSink")
            .field("sinks", &self.sinks.len())
            .field("closed", &self.closed)
            .finish()
    }
}
