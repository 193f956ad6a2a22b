//! Named resource lookup.
//!
//! A name is tried, in order, as an absolute URL, as a filesystem path, under
//! each search directory, and finally among the packaged resources. The first
//! hit wins.

use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use crate::error::ResourceError;
use crate::packaged::{PACKAGED_SCHEME, packaged, packaged_names, packaged_url};
use crate::paths::resources_root;

/// Contents of a loaded resource together with where it came from.
#[derive(Debug, Clone)]
pub struct Resource {
    pub url: Url,
    pub bytes: Vec<u8>,
}

impl Resource {
    /// Filesystem path of the resource, when it lives on disk.
    pub fn file_path(&self) -> Option<PathBuf> {
        file_path(&self.url)
    }
}

/// Listing entry for [`ResourceLocator::catalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub name: String,
    pub url: Url,
    pub packaged: bool,
}

#[derive(Debug, Clone)]
pub struct ResourceLocator {
    search_dirs: Vec<PathBuf>,
    packaged: bool,
}

impl Default for ResourceLocator {
    fn default() -> Self {
        Self {
            search_dirs: vec![resources_root()],
            packaged: true,
        }
    }
}

impl ResourceLocator {
    /// Search the resources root, then packaged resources.
    pub fn new() -> Self {
        Self::default()
    }

    /// A locator that only accepts URLs and existing filesystem paths.
    pub fn empty() -> Self {
        Self {
            search_dirs: Vec::new(),
            packaged: false,
        }
    }

    /// Search `dir` before the directories already configured.
    #[must_use]
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.insert(0, dir.into());
        self
    }

    #[must_use]
    pub fn with_packaged(mut self, enable: bool) -> Self {
        self.packaged = enable;
        self
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Resolve a resource name to a location without reading it.
    pub fn locate(&self, name: &str) -> Result<Url, ResourceError> {
        let name = name.trim();
        if let Some(url) = absolute_url(name) {
            debug!(%name, %url, "resource located as url");
            return Ok(url);
        }
        let direct = Path::new(name);
        if direct.is_file() {
            return path_url(direct);
        }
        if direct.is_relative() {
            for dir in &self.search_dirs {
                let candidate = dir.join(direct);
                if candidate.is_file() {
                    debug!(%name, path = %candidate.display(), "resource located in search dir");
                    return path_url(&candidate);
                }
            }
        }
        if self.packaged
            && let Some(url) = packaged_url(name)
        {
            debug!(%name, %url, "resource located in package");
            return Ok(url);
        }
        Err(ResourceError::NotFound {
            name: name.to_string(),
        })
    }

    /// Read the resource at `url`.
    pub fn open(&self, url: &Url) -> Result<Resource, ResourceError> {
        let bytes = match url.scheme() {
            "file" => {
                let path = file_path(url).ok_or_else(|| ResourceError::UnsupportedScheme {
                    url: url.to_string(),
                })?;
                std::fs::read(&path).map_err(|source| {
                    if source.kind() == std::io::ErrorKind::NotFound {
                        ResourceError::NotFound {
                            name: path.display().to_string(),
                        }
                    } else {
                        ResourceError::io(path, source)
                    }
                })?
            }
            PACKAGED_SCHEME => packaged(url.path())
                .filter(|_| self.packaged)
                .map(|contents| contents.as_bytes().to_vec())
                .ok_or_else(|| ResourceError::NotFound {
                    name: url.to_string(),
                })?,
            _ => {
                return Err(ResourceError::UnsupportedScheme {
                    url: url.to_string(),
                });
            }
        };
        Ok(Resource {
            url: url.clone(),
            bytes,
        })
    }

    /// Locate and read a named resource.
    pub fn load(&self, name: &str) -> Result<Resource, ResourceError> {
        let url = self.locate(name)?;
        self.open(&url)
    }

    /// List resources reachable by name: files under the search directories
    /// (relative names) followed by packaged resources not shadowed by a file.
    pub fn catalog(&self) -> Vec<ResourceEntry> {
        let mut entries: Vec<ResourceEntry> = Vec::new();
        for dir in &self.search_dirs {
            let mut files = Vec::new();
            collect_files(dir, &mut files);
            files.sort();
            for path in files {
                let Ok(relative) = path.strip_prefix(dir) else {
                    continue;
                };
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                if entries.iter().any(|entry| entry.name == name) {
                    continue;
                }
                if let Ok(url) = path_url(&path) {
                    entries.push(ResourceEntry {
                        name,
                        url,
                        packaged: false,
                    });
                }
            }
        }
        if self.packaged {
            for name in packaged_names() {
                if entries.iter().any(|entry| entry.name == name) {
                    continue;
                }
                if let Some(url) = packaged_url(name) {
                    entries.push(ResourceEntry {
                        name: name.to_string(),
                        url,
                        packaged: true,
                    });
                }
            }
        }
        entries
    }
}

/// `Some` when `name` is an absolute URL; single-letter schemes are treated
/// as Windows drive letters.
fn absolute_url(name: &str) -> Option<Url> {
    let url = Url::parse(name).ok()?;
    (url.scheme().len() > 1).then_some(url)
}

fn path_url(path: &Path) -> Result<Url, ResourceError> {
    let absolute = std::fs::canonicalize(path).map_err(|source| ResourceError::io(path, source))?;
    Url::from_file_path(&absolute).map_err(|()| ResourceError::InvalidPath { path: absolute })
}

fn file_path(url: &Url) -> Option<PathBuf> {
    if url.scheme() == "file" {
        url.to_file_path().ok()
    } else {
        None
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out);
        } else if path.is_file() {
            out.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_schema_is_always_available() {
        let locator = ResourceLocator::new().with_search_dir("/nonexistent/resources");
        let resource = locator.load("xsd/sbe.xsd").expect("baseline schema");
        assert!(!resource.bytes.is_empty());
    }

    #[test]
    fn empty_locator_finds_nothing_by_name() {
        let locator = ResourceLocator::empty();
        assert!(matches!(
            locator.locate("xsd/sbe.xsd"),
            Err(ResourceError::NotFound { .. })
        ));
    }

    #[test]
    fn unsupported_scheme_is_reported() {
        let locator = ResourceLocator::empty();
        let url = Url::parse("ftp://example.com/sbe.xsd").unwrap();
        assert!(matches!(
            locator.open(&url),
            Err(ResourceError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn packaged_resources_respect_the_switch() {
        let url = Url::parse("resource:///xsd/sbe.xsd").unwrap();
        assert!(ResourceLocator::new().open(&url).is_ok());
        assert!(ResourceLocator::new().with_packaged(false).open(&url).is_err());
    }
}
