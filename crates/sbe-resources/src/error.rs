use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("resource not found: {name}")]
    NotFound { name: String },

    #[error("failed to read resource {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot derive a base location from {location}")]
    MalformedBase { location: String },

    #[error("cannot resolve reference {reference} against {base}: {source}")]
    InvalidReference {
        reference: String,
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported resource location {url}")]
    UnsupportedScheme { url: String },

    #[error("path {path} cannot be expressed as a URL")]
    InvalidPath { path: PathBuf },
}

impl ResourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
