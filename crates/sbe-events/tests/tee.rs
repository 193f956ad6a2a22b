//! Fan-out behaviour of the composite sink.

use std::sync::{Arc, Mutex};

use sbe_events::{
    EventError, EventSink, MemorySink, SinkSpec, TeeSink, read_event_log,
};
use sbe_model::{EventRecord, Severity, event_args};

/// Appends its label to a shared journal so registration order is observable.
struct Journal {
    label: &'static str,
    journal: Arc<Mutex<Vec<String>>>,
    fail_close: bool,
}

impl EventSink for Journal {
    fn log(&mut self, record: &EventRecord) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.label, record.message()));
    }

    fn close(&mut self) -> Result<(), EventError> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:closed", self.label));
        if self.fail_close {
            Err(EventError::Flush {
                source: std::io::Error::other("cannot flush"),
            })
        } else {
            Ok(())
        }
    }
}

#[test]
fn forwards_to_children_in_registration_order() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let mut tee = TeeSink::new();
    tee.add(Journal {
        label: "a",
        journal: Arc::clone(&journal),
        fail_close: false,
    });
    tee.add(Journal {
        label: "b",
        journal: Arc::clone(&journal),
        fail_close: false,
    });

    tee.info("hello {0}", event_args!["world"]);
    tee.close();

    let entries = journal.lock().unwrap().clone();
    assert_eq!(
        entries,
        vec!["a:hello world", "b:hello world", "a:closed", "b:closed"]
    );
}

#[test]
fn close_failures_are_swallowed_and_other_children_still_close() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let mut tee = TeeSink::new()
        .with(Journal {
            label: "broken",
            journal: Arc::clone(&journal),
            fail_close: true,
        })
        .with(Journal {
            label: "fine",
            journal: Arc::clone(&journal),
            fail_close: false,
        });
    tee.close();
    // A second close is a no-op.
    tee.close();

    let entries = journal.lock().unwrap().clone();
    assert_eq!(entries, vec!["broken:closed", "fine:closed"]);
}

#[test]
fn records_after_close_are_dropped() {
    let memory = MemorySink::new();
    let mut tee = TeeSink::new().with(memory.clone());
    tee.error("before", Vec::new());
    tee.close();
    tee.error("after", Vec::new());
    assert_eq!(memory.records().len(), 1);
}

#[test]
fn each_child_receives_an_independent_copy() {
    let first = MemorySink::new();
    let second = MemorySink::new();
    let mut tee = TeeSink::new().with(first.clone()).with(second.clone());
    tee.warn("careful", Vec::new());
    tee.fatal("stop", Vec::new());
    assert_eq!(first.records(), second.records());
    assert_eq!(first.count(Severity::Fatal), 1);
    assert_eq!(second.count(Severity::Warning), 1);
}

#[test]
fn unavailable_destination_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("events.json");
    let bad = dir.path().join("missing").join("events.json");
    let memory = MemorySink::new();

    let mut tee = TeeSink::from_specs([
        SinkSpec::Json(bad.clone()),
        SinkSpec::Json(good.clone()),
        SinkSpec::Memory(memory.clone()),
    ]);
    assert_eq!(tee.len(), 2);

    tee.error("XML error at line {0} col {1} {2}", event_args![3, 9, "bad"]);
    drop(tee);

    assert!(!bad.exists());
    let events = read_event_log(&good).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Error);
    assert_eq!(events[0].message, "XML error at line 3 col 9 bad");
    assert_eq!(memory.records().len(), 1);
}

#[test]
fn read_event_log_reports_malformed_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{\"severity\":\"info\"\nnot json\n").unwrap();
    assert!(matches!(
        read_event_log(&path),
        Err(EventError::Parse { line: 1, .. })
    ));
}
