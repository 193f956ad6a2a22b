//! Transform engines.
//!
//! The pipeline only needs "apply this script to this input, write that
//! output". [`CommandEngine`] does it by running an external XSLT
//! processor; closures implement [`TransformEngine`] too, which is how
//! tests and in-process engines plug in.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::error::TransformError;

pub trait TransformEngine {
    /// Apply `script` to `input`, writing `output`.
    fn transform(&self, script: &Path, input: &Path, output: &Path) -> Result<(), TransformError>;
}

impl<F> TransformEngine for F
where
    F: Fn(&Path, &Path, &Path) -> Result<(), TransformError>,
{
    fn transform(&self, script: &Path, input: &Path, output: &Path) -> Result<(), TransformError> {
        self(script, input, output)
    }
}

/// External processor invocation.
///
/// `{script}`, `{input}` and `{output}` in `args` are replaced by the stage
/// paths. The defaults run `xsltproc`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "xsltproc".to_string(),
            args: ["--output", "{output}", "{script}", "{input}"]
                .map(String::from)
                .to_vec(),
            working_dir: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    engine: EngineConfig,
}

impl EngineConfig {
    /// Read the `[engine]` table of a TOML file.
    pub fn load(path: &Path) -> Result<Self, TransformError> {
        let text = fs::read_to_string(path).map_err(|source| TransformError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| TransformError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<ConfigFile>(text).map(|file| file.engine)
    }

    fn arguments(&self, script: &Path, input: &Path, output: &Path) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{script}", &script.to_string_lossy())
                    .replace("{input}", &input.to_string_lossy())
                    .replace("{output}", &output.to_string_lossy())
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandEngine {
    config: EngineConfig,
}

impl CommandEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl TransformEngine for CommandEngine {
    fn transform(&self, script: &Path, input: &Path, output: &Path) -> Result<(), TransformError> {
        let program = &self.config.program;
        let args = self.config.arguments(script, input, output);
        debug!(%program, ?args, "running transform");
        let mut command = Command::new(program);
        command.args(&args);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }
        let result = command.output().map_err(|source| TransformError::Spawn {
            program: program.clone(),
            source,
        })?;
        if result.status.success() {
            return Ok(());
        }
        Err(TransformError::Failed {
            program: program.clone(),
            status: result.status.to_string(),
            stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        })
    }
}
