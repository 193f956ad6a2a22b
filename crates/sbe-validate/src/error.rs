use sbe_resources::ResourceError;
use sbe_xml::{TextPosition, XmlError};

/// Failure to load or compile a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("cannot read schema document: {0}")]
    Xml(#[from] XmlError),

    #[error("{location} is not an XML Schema document")]
    NotASchema { location: String },

    #[error("{location}:{position}: {message}")]
    Invalid {
        location: String,
        position: TextPosition,
        message: String,
    },
}

impl SchemaError {
    pub(crate) fn invalid(
        location: impl Into<String>,
        position: TextPosition,
        message: impl Into<String>,
    ) -> Self {
        Self::Invalid {
            location: location.into(),
            position,
            message: message.into(),
        }
    }
}
