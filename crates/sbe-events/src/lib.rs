//! Event reporting for validation runs.
//!
//! Every destination implements [`EventSink`]. A [`TeeSink`] fans each
//! record out to its children in registration order; children never see
//! each other's state, and a failing child never aborts the caller.

pub mod error;
pub mod json;
pub mod log;
pub mod memory;
pub mod registry;
pub mod tee;

pub use error::EventError;
pub use json::{JsonSink, LoggedEvent, read_event_log};
pub use log::LogSink;
pub use memory::MemorySink;
pub use registry::{SinkKind, SinkSpec};
pub use tee::TeeSink;

use sbe_model::EventRecord;

/// A destination for event records.
///
/// `log` must not fail the caller: implementations swallow (and may trace)
/// their own write failures. `close` releases the destination; callers
/// decide whether a close failure matters.
pub trait EventSink {
    fn log(&mut self, record: &EventRecord);

    fn close(&mut self) -> Result<(), EventError> {
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn log(&mut self, record: &EventRecord) {
        (**self).log(record);
    }

    fn close(&mut self) -> Result<(), EventError> {
        (**self).close()
    }
}
