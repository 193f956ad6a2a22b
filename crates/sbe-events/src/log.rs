//! Human-readable event sink backed by `tracing`.

use tracing::{Dispatch, dispatcher};

use sbe_model::{EventRecord, Severity};

use crate::EventSink;

/// Forwards records to an explicitly supplied `tracing` dispatcher.
///
/// `tracing` has no fatal level: fatal records are emitted at `ERROR` with
/// `fatal = true`.
#[derive(Clone)]
pub struct LogSink {
    dispatch: Dispatch,
}

impl LogSink {
    pub fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// Use whichever dispatcher is the default at construction time.
    pub fn current() -> Self {
        Self::new(dispatcher::get_default(Dispatch::clone))
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink").finish_non_exhaustive()
    }
}

impl EventSink for LogSink {
    fn log(&mut self, record: &EventRecord) {
        let message = record.message();
        dispatcher::with_default(&self.dispatch, || match record.severity {
            Severity::Info => tracing::info!(target: "sbe_events", "{message}"),
            Severity::Warning => tracing::warn!(target: "sbe_events", "{message}"),
            Severity::Error => tracing::error!(target: "sbe_events", fatal = false, "{message}"),
            Severity::Fatal => tracing::error!(target: "sbe_events", fatal = true, "{message}"),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex, PoisonError};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn contents(&self) -> String {
            let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn writes_rendered_message_to_supplied_dispatch() {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        let mut sink = LogSink::new(Dispatch::new(subscriber));

        sink.log(&EventRecord::warning("watch {0}", vec!["out".into()]));
        sink.log(&EventRecord::fatal("broken {0}", vec![1.into()]));

        let output = buffer.contents();
        assert!(output.contains("WARN"));
        assert!(output.contains("watch out"));
        assert!(output.contains("broken 1"));
        assert!(output.contains("fatal=true"));
    }
}
