use anyhow::{Context, Result};
use tracing::{debug, info, info_span};

use sbe_model::{SchemaVersion, TransformStage};
use sbe_resources::ResourceLocator;
use sbe_transform::{CommandEngine, EngineConfig, Pipeline, PipelineReport};
use sbe_validate::ValidatorConfig;

use sbe_cli::pipeline::{ConvertOptions, convert, validate};
use sbe_cli::types::{ConvertOutcome, ValidateOutcome};

use crate::cli::{ConvertArgs, EngineArgs, TransformArgs, ValidateArgs};
use crate::summary::print_resources;

pub fn run_validate(args: &ValidateArgs, locator: ResourceLocator) -> ValidateOutcome {
    let version = SchemaVersion::from(args.sbe_version);
    let mut config = ValidatorConfig::new(&args.input)
        .with_version(version)
        .with_xinclude(!args.no_xinclude);
    if let Some(schema) = &args.schema {
        config = config.with_schema(schema.as_str());
    }
    if let Some(path) = &args.event_log {
        config = config.with_event_log(path);
    }
    validate(config, locator)
}

pub fn run_convert(args: &ConvertArgs, locator: ResourceLocator) -> Result<ConvertOutcome> {
    let engine = command_engine(&args.engine)?;
    let options = ConvertOptions::new(&args.orchestra, args.sbe_version.into())
        .with_work_dir(&args.work_dir)
        .with_event_log(args.event_log.clone())
        .with_validation(!args.no_validate)
        .with_locator(locator);
    convert(&options, engine).context("convert Orchestra repository")
}

pub fn run_transform(args: &TransformArgs, locator: ResourceLocator) -> Result<PipelineReport> {
    let span = info_span!("transform", script = %args.script);
    let _guard = span.enter();
    let engine = command_engine(&args.engine)?;
    let stage = TransformStage::new(args.script.as_str(), &args.input, &args.output);
    let report = Pipeline::new(engine)
        .with_locator(locator)
        .run_stages(&[stage])
        .with_context(|| format!("apply {}", args.script))?;
    info!(output = %args.output.display(), "transform complete");
    Ok(report)
}

pub fn run_resources(locator: &ResourceLocator) {
    let entries = locator.catalog();
    debug!(count = entries.len(), "resources listed");
    print_resources(&entries);
}

fn command_engine(args: &EngineArgs) -> Result<CommandEngine> {
    let config = match &args.engine_config {
        Some(path) => EngineConfig::load(path).context("load engine configuration")?,
        None => EngineConfig::default(),
    };
    debug!(program = %config.program, "transform engine");
    Ok(CommandEngine::new(config))
}
