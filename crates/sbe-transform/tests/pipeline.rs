//! Pipeline runs with in-process engines.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use sbe_model::SchemaVersion;
use sbe_resources::{ResourceError, ResourceLocator};
use sbe_transform::{Pipeline, PipelineError, TransformError, sbe_stages};

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let scripts = dir.path().join("scripts");
        fs::create_dir_all(&scripts).unwrap();
        for script in ["SBE_datatypes.xslt", "OrchestraToSBEV1.xslt", "OrchestraToSBEV2.xslt"] {
            fs::write(scripts.join(script), "<xsl:stylesheet/>").unwrap();
        }
        fs::write(dir.path().join("trade.xml"), "<repository/>").unwrap();
        Self { dir }
    }

    fn locator(&self) -> ResourceLocator {
        ResourceLocator::empty().with_search_dir(self.dir.path().join("scripts"))
    }

    fn orchestra(&self) -> PathBuf {
        self.dir.path().join("trade.xml")
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("target").join("test")
    }
}

fn copy(_: &Path, input: &Path, output: &Path) -> Result<(), TransformError> {
    fs::copy(input, output)
        .map(|_| ())
        .map_err(|error| TransformError::engine(error.to_string()))
}

#[test]
fn runs_both_stages_in_order() {
    let workspace = Workspace::new();
    let calls = RefCell::new(Vec::new());
    let engine = |script: &Path, input: &Path, output: &Path| {
        calls
            .borrow_mut()
            .push(script.file_name().unwrap().to_string_lossy().into_owned());
        copy(script, input, output)
    };
    let stages = sbe_stages(SchemaVersion::V1, &workspace.orchestra(), &workspace.out());

    let report = Pipeline::new(engine)
        .with_locator(workspace.locator())
        .run_stages(&stages)
        .unwrap();

    assert_eq!(report.stages.len(), 2);
    assert_eq!(
        report.final_output(),
        Some(workspace.out().join("SbeSchemaV1.xml").as_path())
    );
    assert_eq!(report.stages[0].bytes, "<repository/>".len() as u64);
    assert_eq!(*calls.borrow(), vec!["SBE_datatypes.xslt", "OrchestraToSBEV1.xslt"]);
    assert!(workspace.out().join("OrchestraWithSbeDatatypesV1.xml").is_file());
}

#[test]
fn stage_two_never_runs_without_stage_one_output() {
    let workspace = Workspace::new();
    let calls = RefCell::new(0);
    let engine = |_: &Path, _: &Path, _: &Path| -> Result<(), TransformError> {
        *calls.borrow_mut() += 1;
        Ok(())
    };
    let stages = sbe_stages(SchemaVersion::V2, &workspace.orchestra(), &workspace.out());

    let error = Pipeline::new(engine)
        .with_locator(workspace.locator())
        .run_stages(&stages)
        .unwrap_err();

    assert!(matches!(error, PipelineError::MissingOutput { stage: 1, .. }), "{error}");
    assert_eq!(*calls.borrow(), 1);
    assert!(!workspace.out().join("SbeSchemaV2.xml").exists());
}

#[test]
fn empty_output_fails_the_stage() {
    let workspace = Workspace::new();
    let engine = |_: &Path, _: &Path, output: &Path| -> Result<(), TransformError> {
        fs::write(output, "").map_err(|error| TransformError::engine(error.to_string()))
    };
    let stages = sbe_stages(SchemaVersion::V1, &workspace.orchestra(), &workspace.out());

    let error = Pipeline::new(engine)
        .with_locator(workspace.locator())
        .run_stages(&stages)
        .unwrap_err();
    assert!(matches!(error, PipelineError::EmptyOutput { stage: 1, .. }), "{error}");
}

#[test]
fn stale_output_does_not_count_as_success() {
    let workspace = Workspace::new();
    let stages = sbe_stages(SchemaVersion::V1, &workspace.orchestra(), &workspace.out());
    fs::create_dir_all(workspace.out()).unwrap();
    fs::write(&stages[0].output, "<stale/>").unwrap();

    let engine = |_: &Path, _: &Path, _: &Path| -> Result<(), TransformError> { Ok(()) };
    let error = Pipeline::new(engine)
        .with_locator(workspace.locator())
        .run_stages(&stages)
        .unwrap_err();
    assert!(matches!(error, PipelineError::MissingOutput { stage: 1, .. }));
    assert!(!stages[0].output.exists());
}

#[test]
fn engine_failure_keeps_earlier_artifacts() {
    let workspace = Workspace::new();
    let engine = |script: &Path, input: &Path, output: &Path| {
        if script.ends_with("OrchestraToSBEV1.xslt") {
            return Err(TransformError::engine("mapping failed"));
        }
        copy(script, input, output)
    };
    let stages = sbe_stages(SchemaVersion::V1, &workspace.orchestra(), &workspace.out());

    let error = Pipeline::new(engine)
        .with_locator(workspace.locator())
        .run_stages(&stages)
        .unwrap_err();
    assert_eq!(error.stage(), 2);
    assert!(matches!(error, PipelineError::Stage { .. }));
    assert!(stages[0].output.is_file());
}

#[test]
fn unknown_script_is_a_stage_failure() {
    let workspace = Workspace::new();
    let stages = [sbe_model::TransformStage::new(
        "Missing.xslt",
        workspace.orchestra(),
        workspace.out().join("out.xml"),
    )];
    let error = Pipeline::new(copy)
        .with_locator(workspace.locator())
        .run_stages(&stages)
        .unwrap_err();
    assert!(matches!(
        error,
        PipelineError::Stage {
            stage: 1,
            source: TransformError::Resource(ResourceError::NotFound { .. }),
            ..
        }
    ));
}

#[cfg(unix)]
#[test]
fn command_engine_runs_external_program() {
    use sbe_transform::{CommandEngine, EngineConfig};

    let workspace = Workspace::new();
    let engine = CommandEngine::new(EngineConfig {
        program: "cp".to_string(),
        args: vec!["{input}".to_string(), "{output}".to_string()],
        working_dir: None,
    });
    let stages = sbe_stages(SchemaVersion::V1, &workspace.orchestra(), &workspace.out());
    let report = Pipeline::new(engine)
        .with_locator(workspace.locator())
        .run_stages(&stages)
        .unwrap();
    assert_eq!(
        fs::read_to_string(report.final_output().unwrap()).unwrap(),
        "<repository/>"
    );
}
