//! Resources directory path resolution.

use std::path::PathBuf;

/// Environment variable for overriding the resources directory.
pub const RESOURCES_ENV_VAR: &str = "SBE_RESOURCES_DIR";

/// Get the resources root directory.
///
/// Resolution order:
/// 1. `SBE_RESOURCES_DIR` environment variable
/// 2. `resources/` directory relative to workspace root
///
/// # Example
///
/// ```rust,ignore
/// let root = sbe_resources::resources_root();
/// let xsd_dir = root.join("xsd");
/// ```
pub fn resources_root() -> PathBuf {
    if let Ok(root) = std::env::var(RESOURCES_ENV_VAR) {
        return PathBuf::from(root);
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../resources")
}
