use std::path::PathBuf;

use sbe_resources::ResourceError;

use crate::tree::{MAX_ELEMENT_DEPTH, TextPosition};

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Syntax {
        position: TextPosition,
        message: String,
    },

    #[error("document {location} is not valid UTF-8")]
    Encoding { location: String },

    #[error("{message}")]
    Include {
        position: TextPosition,
        message: String,
    },

    #[error("element nesting exceeds {limit} levels")]
    Depth { position: TextPosition, limit: usize },

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl XmlError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn include(position: TextPosition, message: impl Into<String>) -> Self {
        Self::Include {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn depth(position: TextPosition) -> Self {
        Self::Depth {
            position,
            limit: MAX_ELEMENT_DEPTH,
        }
    }

    /// Location of the problem in the document being read, when known.
    pub fn position(&self) -> Option<TextPosition> {
        match self {
            XmlError::Syntax { position, .. }
            | XmlError::Include { position, .. }
            | XmlError::Depth { position, .. } => Some(*position),
            _ => None,
        }
    }
}
