//! SBE schema dialect versions.
//!
//! A [`SchemaVersion`] selects both the stage-2 mapping script and the XSD
//! used to validate its output. Callers are responsible for keeping the two
//! paired; the validator does not detect a mismatch other than by failing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownSchemaVersion;

/// Baseline schema identity used when no schema is named.
pub const BASELINE_SCHEMA: &str = "xsd/sbe.xsd";

/// Stage-1 script injecting SBE datatype mappings into an Orchestra repository.
pub const DATATYPES_SCRIPT: &str = "SBE_datatypes.xslt";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// SBE 1.0.
    #[default]
    V1,
    /// SBE 2.0 release candidate 3.
    V2,
}

impl SchemaVersion {
    pub const ALL: [SchemaVersion; 2] = [SchemaVersion::V1, SchemaVersion::V2];

    pub fn label(self) -> &'static str {
        match self {
            SchemaVersion::V1 => "V1",
            SchemaVersion::V2 => "V2",
        }
    }

    /// Resource name of the XSD for this dialect.
    pub fn xsd(self) -> &'static str {
        match self {
            SchemaVersion::V1 => BASELINE_SCHEMA,
            SchemaVersion::V2 => "xsd/sbe-2.0rc3.xsd",
        }
    }

    /// Resource name of the Orchestra-to-SBE mapping script.
    pub fn mapping_script(self) -> &'static str {
        match self {
            SchemaVersion::V1 => "OrchestraToSBEV1.xslt",
            SchemaVersion::V2 => "OrchestraToSBEV2.xslt",
        }
    }

    /// Target namespace of the SBE dialect.
    pub fn namespace(self) -> &'static str {
        match self {
            SchemaVersion::V1 => "http://fixprotocol.io/2016/sbe",
            SchemaVersion::V2 => "http://fixprotocol.io/2017/sbe",
        }
    }

    /// File name of the intermediate document carrying injected datatypes.
    pub fn datatypes_artifact(self) -> String {
        format!("OrchestraWithSbeDatatypes{}.xml", self.label())
    }

    /// File name of the candidate SBE schema document.
    pub fn schema_artifact(self) -> String {
        format!("SbeSchema{}.xml", self.label())
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SchemaVersion {
    type Err = UnknownSchemaVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" | "1.0" => Ok(SchemaVersion::V1),
            "v2" | "2" | "2.0" | "2.0rc3" => Ok(SchemaVersion::V2),
            _ => Err(UnknownSchemaVersion {
                label: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_labels() {
        assert_eq!("V1".parse::<SchemaVersion>(), Ok(SchemaVersion::V1));
        assert_eq!("2.0rc3".parse::<SchemaVersion>(), Ok(SchemaVersion::V2));
        assert!("v3".parse::<SchemaVersion>().is_err());
    }

    #[test]
    fn script_and_xsd_stay_paired() {
        for version in SchemaVersion::ALL {
            assert!(version.mapping_script().contains(version.label()));
            assert!(version.schema_artifact().contains(version.label()));
        }
        assert_eq!(SchemaVersion::V1.xsd(), BASELINE_SCHEMA);
        assert_ne!(SchemaVersion::V1.xsd(), SchemaVersion::V2.xsd());
    }
}
