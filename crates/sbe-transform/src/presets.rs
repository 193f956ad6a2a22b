//! The two-stage Orchestra to SBE conversion.

use std::path::Path;

use sbe_model::{DATATYPES_SCRIPT, SchemaVersion, TransformStage};

/// Stages converting the Orchestra repository at `orchestra` into an SBE
/// message schema of `version`, with artifacts written under `work_dir`.
///
/// Stage 1 injects SBE datatype mappings into the repository; stage 2
/// maps the enriched repository to the SBE dialect.
pub fn sbe_stages(version: SchemaVersion, orchestra: &Path, work_dir: &Path) -> [TransformStage; 2] {
    let datatypes = TransformStage::new(
        DATATYPES_SCRIPT,
        orchestra,
        work_dir.join(version.datatypes_artifact()),
    );
    let schema = datatypes.then(version.mapping_script(), work_dir.join(version.schema_artifact()));
    [datatypes, schema]
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn stages_chain_through_the_datatypes_artifact() {
        let [first, second] = sbe_stages(SchemaVersion::V2, Path::new("trade.xml"), Path::new("target"));
        assert_eq!(first.script, "SBE_datatypes.xslt");
        assert_eq!(first.input, PathBuf::from("trade.xml"));
        assert_eq!(first.output, PathBuf::from("target/OrchestraWithSbeDatatypesV2.xml"));
        assert_eq!(second.script, "OrchestraToSBEV2.xslt");
        assert_eq!(second.input, first.output);
        assert_eq!(second.output, PathBuf::from("target/SbeSchemaV2.xml"));
    }
}
