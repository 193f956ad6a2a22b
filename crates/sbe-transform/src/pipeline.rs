//! Strictly ordered execution of transform stages.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span};

use sbe_model::TransformStage;
use sbe_resources::ResourceLocator;

use crate::engine::TransformEngine;
use crate::error::{PipelineError, TransformError};

/// Result of one completed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub script: PathBuf,
    pub output: PathBuf,
    /// Size of the output artifact in bytes.
    pub bytes: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    /// Output of the last stage, if any stage ran.
    pub fn final_output(&self) -> Option<&Path> {
        self.stages.last().map(|stage| stage.output.as_path())
    }
}

/// Runs stages in order with one engine.
///
/// A stage succeeds when the engine returns `Ok` and its declared output
/// exists and is not empty. The first failing stage stops the run; outputs
/// already produced are left in place. Any stale output is removed before
/// its stage runs.
pub struct Pipeline<E> {
    engine: E,
    locator: ResourceLocator,
}

impl<E: TransformEngine> Pipeline<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            locator: ResourceLocator::new(),
        }
    }

    /// Locate scripts through `locator`.
    #[must_use]
    pub fn with_locator(mut self, locator: ResourceLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn run_stages(&self, stages: &[TransformStage]) -> Result<PipelineReport, PipelineError> {
        let mut report = PipelineReport::default();
        for (index, stage) in stages.iter().enumerate() {
            let number = index + 1;
            let span = info_span!("stage", number, script = %stage.script);
            let _guard = span.enter();
            report.stages.push(self.run_stage(number, stage)?);
        }
        Ok(report)
    }

    fn run_stage(&self, number: usize, stage: &TransformStage) -> Result<StageReport, PipelineError> {
        let failed = |source: TransformError| PipelineError::Stage {
            stage: number,
            script: stage.script.clone(),
            source,
        };
        let script = self.script_path(&stage.script).map_err(failed)?;
        if !stage.input.is_file() {
            return Err(PipelineError::MissingInput {
                stage: number,
                path: stage.input.clone(),
            });
        }
        prepare_output(&stage.output).map_err(|source| PipelineError::Prepare {
            stage: number,
            path: stage.output.clone(),
            source,
        })?;

        debug!(script = %script.display(), input = %stage.input.display(), output = %stage.output.display(), "transforming");
        let started = Instant::now();
        self.engine
            .transform(&script, &stage.input, &stage.output)
            .map_err(failed)?;
        let elapsed = started.elapsed();

        let bytes = match fs::metadata(&stage.output) {
            Ok(metadata) if metadata.is_file() => metadata.len(),
            _ => {
                return Err(PipelineError::MissingOutput {
                    stage: number,
                    script: stage.script.clone(),
                    path: stage.output.clone(),
                });
            }
        };
        if bytes == 0 {
            return Err(PipelineError::EmptyOutput {
                stage: number,
                script: stage.script.clone(),
                path: stage.output.clone(),
            });
        }
        info!(output = %stage.output.display(), bytes, elapsed_ms = elapsed.as_millis(), "stage complete");
        Ok(StageReport {
            script,
            output: stage.output.clone(),
            bytes,
            elapsed,
        })
    }

    fn script_path(&self, name: &str) -> Result<PathBuf, TransformError> {
        let url = self.locator.locate(name)?;
        url.to_file_path()
            .map_err(|()| TransformError::ScriptNotOnDisk {
                script: url.to_string(),
            })
    }
}

fn prepare_output(output: &Path) -> std::io::Result<()> {
    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    match fs::remove_file(output) {
        Ok(()) => {
            debug!(path = %output.display(), "removed stale output");
            Ok(())
        }
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error),
    }
}
