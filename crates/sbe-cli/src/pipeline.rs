//! Conversion and validation runs behind the subcommands.

use std::path::PathBuf;

use tracing::{info, info_span};

use sbe_model::SchemaVersion;
use sbe_resources::ResourceLocator;
use sbe_transform::{Pipeline, PipelineError, TransformEngine, sbe_stages};
use sbe_validate::{SbeSchemaValidator, ValidatorConfig};

use crate::types::{ConvertOutcome, ValidateOutcome};

pub const DEFAULT_WORK_DIR: &str = "target/sbe";

/// Inputs of one Orchestra to SBE conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub orchestra: PathBuf,
    pub version: SchemaVersion,
    pub work_dir: PathBuf,
    pub event_log: Option<PathBuf>,
    pub validate: bool,
    pub locator: ResourceLocator,
}

impl ConvertOptions {
    pub fn new(orchestra: impl Into<PathBuf>, version: SchemaVersion) -> Self {
        Self {
            orchestra: orchestra.into(),
            version,
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            event_log: None,
            validate: true,
            locator: ResourceLocator::new(),
        }
    }

    #[must_use]
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_event_log(mut self, path: Option<PathBuf>) -> Self {
        self.event_log = path;
        self
    }

    #[must_use]
    pub fn with_validation(mut self, enable: bool) -> Self {
        self.validate = enable;
        self
    }

    /// Locate scripts and schemas through `locator`.
    #[must_use]
    pub fn with_locator(mut self, locator: ResourceLocator) -> Self {
        self.locator = locator;
        self
    }
}

/// Run both SBE stages, then validate the produced schema against the XSD
/// of the same version.
///
/// A failing stage is an error; an invalid schema is not, it shows up in
/// [`ConvertOutcome::validation`].
pub fn convert<E: TransformEngine>(
    options: &ConvertOptions,
    engine: E,
) -> Result<ConvertOutcome, PipelineError> {
    let span = info_span!("convert", orchestra = %options.orchestra.display(), version = %options.version);
    let _guard = span.enter();

    let stages = sbe_stages(options.version, &options.orchestra, &options.work_dir);
    let report = Pipeline::new(engine)
        .with_locator(options.locator.clone())
        .run_stages(&stages)?;
    let [_, last] = stages;
    let schema = last.output;
    info!(schema = %schema.display(), "SBE schema written");

    let validation = options.validate.then(|| {
        let mut config = ValidatorConfig::new(&schema).with_version(options.version);
        if let Some(path) = &options.event_log {
            config = config.with_event_log(path);
        }
        SbeSchemaValidator::new(config)
            .with_locator(options.locator.clone())
            .validate()
    });
    Ok(ConvertOutcome {
        version: options.version,
        report,
        schema,
        validation,
    })
}

/// Validate one document.
pub fn validate(config: ValidatorConfig, locator: ResourceLocator) -> ValidateOutcome {
    let validator = SbeSchemaValidator::new(config).with_locator(locator);
    let result = validator.validate();
    let config = validator.config();
    ValidateOutcome {
        input: config.input.clone(),
        schema: config.schema.clone(),
        event_log: config.event_log.clone(),
        result,
    }
}
