use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One transform invocation: apply `script` to `input`, producing `output`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformStage {
    /// Resource name (or path) of the transform script.
    pub script: String,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl TransformStage {
    pub fn new(
        script: impl Into<String>,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            script: script.into(),
            input: input.into(),
            output: output.into(),
        }
    }

    /// Build the stage that consumes this stage's output.
    #[must_use]
    pub fn then(&self, script: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self::new(script, self.output.clone(), output)
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn then_chains_output_into_input() {
        let first = TransformStage::new("a.xslt", "in.xml", "mid.xml");
        let second = first.then("b.xslt", "out.xml");
        assert_eq!(second.input, PathBuf::from("mid.xml"));
        assert_eq!(second.output(), Path::new("out.xml"));
        assert_eq!(second.script, "b.xslt");
    }
}
