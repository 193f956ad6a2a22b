use std::path::PathBuf;

use thiserror::Error;

use sbe_resources::ResourceError;

/// Failure of a single transform invocation.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("transform script {script} is not a file on disk")]
    ScriptNotOnDisk { script: String },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("failed to read engine configuration {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid engine configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{message}")]
    Engine { message: String },
}

impl TransformError {
    /// Failure reported by an in-process engine.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }
}

/// Failure of a pipeline run. Carries the 1-based number of the stage
/// that stopped the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage {stage}: input {path} does not exist")]
    MissingInput { stage: usize, path: PathBuf },

    #[error("stage {stage}: cannot prepare output {path}: {source}")]
    Prepare {
        stage: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stage {stage} ({script}) failed: {source}")]
    Stage {
        stage: usize,
        script: String,
        #[source]
        source: TransformError,
    },

    #[error("stage {stage} ({script}) did not produce {path}")]
    MissingOutput {
        stage: usize,
        script: String,
        path: PathBuf,
    },

    #[error("stage {stage} ({script}) produced an empty {path}")]
    EmptyOutput {
        stage: usize,
        script: String,
        path: PathBuf,
    },
}

impl PipelineError {
    /// 1-based number of the failing stage.
    pub fn stage(&self) -> usize {
        match self {
            PipelineError::MissingInput { stage, .. }
            | PipelineError::Prepare { stage, .. }
            | PipelineError::Stage { stage, .. }
            | PipelineError::MissingOutput { stage, .. }
            | PipelineError::EmptyOutput { stage, .. } => *stage,
        }
    }
}
