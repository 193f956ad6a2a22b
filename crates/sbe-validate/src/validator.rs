//! A complete validation run: sinks, parsing, schema loading, counting.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{Dispatch, debug, dispatcher, error, info_span};
use url::Url;

use sbe_events::{EventError, EventSink, JsonSink, LogSink, SinkSpec, TeeSink};
use sbe_model::{
    BASELINE_SCHEMA, EventRecord, SchemaVersion, Severity, ValidationResult, event_args,
};
use sbe_resources::ResourceLocator;
use sbe_xml::DocumentLoader;

use crate::problem::Problem;
use crate::schema::Schema;

pub const ERROR_TEMPLATE: &str = "SbeSchemaValidator: XML error at line {0} col {1} {2}";
pub const FATAL_TEMPLATE: &str = "SbeSchemaValidator: XML fatal error at line {0} col {1} {2}";
pub const WARNING_TEMPLATE: &str = "SbeSchemaValidator: XML warning at line {0} col {1} {2}";
pub const FAILURE_TEMPLATE: &str = "Failed to validate SBE schema, {0}";
pub const SUMMARY_TEMPLATE: &str = "SbeSchemaValidator complete; fatal errors={0,number,integer} errors={1,number,integer} warnings={2,number,integer}";

/// What to validate and where to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Candidate SBE schema document.
    pub input: PathBuf,
    /// Schema resource name, path or URL. Defaults to [`BASELINE_SCHEMA`].
    pub schema: String,
    /// Destination of the newline-delimited JSON event log.
    pub event_log: Option<PathBuf>,
    /// Resolve XInclude directives in the input. Defaults to `true`.
    pub xinclude: bool,
}

impl ValidatorConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            schema: BASELINE_SCHEMA.to_string(),
            event_log: None,
            xinclude: true,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Validate against the XSD of `version`.
    #[must_use]
    pub fn with_version(self, version: SchemaVersion) -> Self {
        self.with_schema(version.xsd())
    }

    #[must_use]
    pub fn with_event_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.event_log = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_xinclude(mut self, enable: bool) -> Self {
        self.xinclude = enable;
        self
    }
}

/// Validates one SBE schema document per call to [`SbeSchemaValidator::validate`].
///
/// Every run opens its own sinks and counts from zero, so repeated runs
/// over the same input produce the same result.
#[derive(Debug, Clone)]
pub struct SbeSchemaValidator {
    config: ValidatorConfig,
    locator: ResourceLocator,
    dispatch: Option<Dispatch>,
    sinks: Vec<SinkSpec>,
}

impl SbeSchemaValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config,
            locator: ResourceLocator::new(),
            dispatch: None,
            sinks: Vec::new(),
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Resolve schema and include references through `locator`.
    #[must_use]
    pub fn with_locator(mut self, locator: ResourceLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Send the human-readable log to `dispatch` rather than the default dispatcher.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Report to an additional sink.
    #[must_use]
    pub fn with_sink(mut self, spec: SinkSpec) -> Self {
        self.sinks.push(spec);
        self
    }

    /// Run the validation. Never fails: every problem, including a failure
    /// to parse the input or load the schema, is counted in the result.
    pub fn validate(&self) -> ValidationResult {
        let input = &self.config.input;
        let span = info_span!("validate", input = %input.display(), schema = %self.config.schema);
        let _guard = span.enter();

        let bytes = match fs::read(input) {
            Ok(bytes) => bytes,
            Err(source) => {
                error!(input = %input.display(), error = %source, "cannot read input");
                return top_level_failure(&format!("cannot read {}: {source}", input.display()));
            }
        };
        let mut tee = match self.open_sinks() {
            Ok(tee) => tee,
            Err(source) => {
                error!(error = %source, "cannot open event log");
                return top_level_failure(&format!("cannot open event log: {source}"));
            }
        };

        let mut run = Run {
            tee: &mut tee,
            result: ValidationResult::new(),
        };
        if let Err(message) = self.check(&bytes, &mut run) {
            run.failure(message);
        }
        let result = run.result;
        tee.emit(
            result.summary_severity(),
            SUMMARY_TEMPLATE,
            event_args![result.fatal_errors(), result.errors(), result.warnings()],
        );
        tee.close();
        debug!(
            valid = result.is_valid(),
            errors = result.errors(),
            fatal_errors = result.fatal_errors(),
            warnings = result.warnings(),
            "validation complete"
        );
        result
    }

    /// The log sink, the configured event log, then the extra sinks. Only
    /// the event log is required to open.
    fn open_sinks(&self) -> Result<TeeSink, EventError> {
        let dispatch = self
            .dispatch
            .clone()
            .unwrap_or_else(|| dispatcher::get_default(Dispatch::clone));
        let mut tee = TeeSink::new().with(LogSink::new(dispatch));
        if let Some(path) = &self.config.event_log {
            tee.add(JsonSink::create(path)?);
        }
        tee.add_specs(self.sinks.iter().cloned());
        Ok(tee)
    }

    /// Parse, load and validate. `Err` carries the message of a failure
    /// that stopped the run.
    fn check(&self, bytes: &[u8], run: &mut Run<'_>) -> Result<(), String> {
        let loader = DocumentLoader::new(self.locator.clone()).with_xinclude(self.config.xinclude);
        let document = match loader.parse_bytes(bytes, input_url(&self.config.input)) {
            Ok(document) => document,
            Err(error) => match error.position() {
                Some(position) => {
                    run.problem(Problem::new(Severity::Fatal, Some(position), error.to_string()));
                    return Ok(());
                }
                None => return Err(error.to_string()),
            },
        };
        let schema = Schema::load(&self.locator, &self.config.schema).map_err(|error| error.to_string())?;
        debug!(schema = %schema.location(), "schema loaded");
        for warning in schema.warnings() {
            run.problem(warning.clone());
        }
        schema.validate(&document, &mut |problem| run.problem(problem));
        Ok(())
    }
}

/// Counts problems and reports each one as an event.
struct Run<'t> {
    tee: &'t mut TeeSink,
    result: ValidationResult,
}

impl Run<'_> {
    fn problem(&mut self, problem: Problem) {
        self.result.record(problem.severity);
        let template = match problem.severity {
            Severity::Fatal => FATAL_TEMPLATE,
            Severity::Error => ERROR_TEMPLATE,
            Severity::Warning | Severity::Info => WARNING_TEMPLATE,
        };
        self.tee.emit(
            problem.severity,
            template,
            event_args![problem.line(), problem.column(), problem.message],
        );
    }

    fn failure(&mut self, message: String) {
        self.result.record(Severity::Fatal);
        self.tee.log(&EventRecord::fatal(FAILURE_TEMPLATE, event_args![message]));
    }
}

/// A failure before any sink exists goes to stderr and counts as one fatal
/// error.
fn top_level_failure(message: &str) -> ValidationResult {
    eprintln!("Failed to validate SBE schema, {message}");
    let mut result = ValidationResult::new();
    result.record(Severity::Fatal);
    result
}

fn input_url(path: &Path) -> Option<Url> {
    let path = fs::canonicalize(path).ok()?;
    Url::from_file_path(path).ok()
}

/// Validate `input` against `schema`, optionally writing a JSON event log.
/// Returns the verdict.
pub fn validate(input: impl Into<PathBuf>, schema: &str, event_log: Option<&Path>) -> bool {
    let mut config = ValidatorConfig::new(input).with_schema(schema);
    if let Some(path) = event_log {
        config = config.with_event_log(path);
    }
    SbeSchemaValidator::new(config).validate().is_valid()
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use sbe_events::MemorySink;

    use super::*;

    #[test]
    fn config_defaults_to_baseline_schema() {
        let config = ValidatorConfig::new("SbeSchemaV1.xml");
        assert_eq!(config.schema, BASELINE_SCHEMA);
        assert_eq!(config.event_log, None);
        assert!(config.xinclude);

        let config = config.with_version(SchemaVersion::V2).with_event_log("events.json");
        assert_eq!(config.schema, "xsd/sbe-2.0rc3.xsd");
        assert_eq!(config.event_log, Some(PathBuf::from("events.json")));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn reports_to_explicit_dispatch_and_extra_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("unknown.xml");
        fs::write(&input, "<unknown/>").unwrap();

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let memory = MemorySink::new();
        let result = SbeSchemaValidator::new(ValidatorConfig::new(&input))
            .with_dispatch(Dispatch::new(subscriber))
            .with_sink(SinkSpec::Memory(memory.clone()))
            .validate();
        assert_eq!(result.errors(), 1);

        let records = memory.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].template, ERROR_TEMPLATE);
        assert_eq!(records[1].template, SUMMARY_TEMPLATE);
        assert_eq!(records[1].severity, Severity::Fatal);

        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("cvc-elt.1.a: Cannot find the declaration of element 'unknown'."));
        assert!(text.contains("SbeSchemaValidator complete; fatal errors=0 errors=1 warnings=0"));
    }

    #[test]
    fn extra_sink_that_cannot_open_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("unknown.xml");
        fs::write(&input, "<unknown/>").unwrap();

        let memory = MemorySink::new();
        let result = SbeSchemaValidator::new(ValidatorConfig::new(&input))
            .with_sink(SinkSpec::Json(dir.path().join("missing").join("events.json")))
            .with_sink(SinkSpec::Memory(memory.clone()))
            .validate();
        assert_eq!(result.fatal_errors(), 0);
        assert_eq!(result.errors(), 1);

        let records = memory.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].template, SUMMARY_TEMPLATE);
    }

    #[test]
    fn unwritable_event_log_is_a_top_level_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("unknown.xml");
        fs::write(&input, "<unknown/>").unwrap();

        let memory = MemorySink::new();
        let config = ValidatorConfig::new(&input).with_event_log(dir.path().join("missing").join("events.json"));
        let result = SbeSchemaValidator::new(config)
            .with_sink(SinkSpec::Memory(memory.clone()))
            .validate();
        assert_eq!(result.fatal_errors(), 1);
        assert!(memory.records().is_empty());
    }

    #[test]
    fn unreadable_input_is_one_fatal_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ValidatorConfig::new(dir.path().join("missing.xml"));
        let result = SbeSchemaValidator::new(config).validate();
        assert!(!result.is_valid());
        assert_eq!(result.fatal_errors(), 1);
        assert_eq!(result.errors(), 0);
    }
}
