//! Base-relative resolution of references found inside a schema artifact.

use tracing::debug;
use url::Url;

use crate::error::ResourceError;

/// Derive the parent location of `location`.
///
/// Scheme, authority and port are preserved; only the path is replaced by
/// its parent (with a trailing `/`). Query and fragment are dropped.
pub fn parent_url(location: &Url) -> Result<Url, ResourceError> {
    if location.cannot_be_a_base() {
        return Err(ResourceError::MalformedBase {
            location: location.to_string(),
        });
    }
    let path = location.path();
    let Some(slash) = path.rfind('/') else {
        return Err(ResourceError::MalformedBase {
            location: location.to_string(),
        });
    };
    let mut base = location.clone();
    base.set_path(&path[..=slash]);
    base.set_query(None);
    base.set_fragment(None);
    Ok(base)
}

/// Resolves relative references against the directory of a loaded artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceResolver {
    base: Url,
}

impl ResourceResolver {
    /// Build a resolver for references found inside the artifact at `location`.
    pub fn for_artifact(location: &Url) -> Result<Self, ResourceError> {
        let base = parent_url(location)?;
        debug!(%location, %base, "derived resource base");
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve `reference`; absolute references are returned unchanged.
    pub fn resolve(&self, reference: &str) -> Result<Url, ResourceError> {
        self.base
            .join(reference.trim())
            .map_err(|source| ResourceError::InvalidReference {
                reference: reference.to_string(),
                base: self.base.to_string(),
                source,
            })
    }
}
