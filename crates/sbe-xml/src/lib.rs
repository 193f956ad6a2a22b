//! XML input for the validator.
//!
//! Documents are parsed with `roxmltree` and converted into an owned tree
//! ([`Document`], [`Element`]) that keeps expanded names, in-scope
//! namespace bindings and 1-based source positions. [`DocumentLoader`]
//! resolves XInclude directives while loading.

pub mod error;
pub mod loader;
pub mod parse;
pub mod tree;

pub use error::XmlError;
pub use loader::{DocumentLoader, XINCLUDE_NAMESPACE};
pub use parse::{decode, parse_document};
pub use tree::{
    Attribute, Document, Element, MAX_ELEMENT_DEPTH, NamespaceBinding, Node, QName, TextPosition,
    XML_NAMESPACE,
};

/// Namespace of `xsi:nil`, `xsi:type` and schema location hints.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
