//! XSD validation of SBE message schema documents.
//!
//! A [`Schema`] is loaded from a resource name, compiled once, and then
//! validates documents through a problem callback. [`SbeSchemaValidator`]
//! wraps a whole run: it reports every problem to a tee of event sinks,
//! counts them by severity and closes with a summary event.
//!
//! The enforced subset of XML Schema 1.0 covers what SBE message schemas
//! use. Identity constraints, substitution groups and redefinitions are
//! read, reported once as warnings, and not enforced.

pub mod content;
pub mod datatype;
pub mod error;
pub mod instance;
pub mod problem;
pub mod schema;
pub mod validator;

pub use error::SchemaError;
pub use problem::Problem;
pub use schema::{Schema, SchemaDocument, SchemaSet, XS_NAMESPACE};
pub use validator::{
    ERROR_TEMPLATE, FAILURE_TEMPLATE, FATAL_TEMPLATE, SUMMARY_TEMPLATE, SbeSchemaValidator,
    ValidatorConfig, WARNING_TEMPLATE, validate,
};
