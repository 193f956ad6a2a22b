pub mod error;
pub mod event;
pub mod result;
pub mod stage;
pub mod template;
pub mod version;

pub use error::UnknownSchemaVersion;
pub use event::{EventArg, EventRecord, Severity};
pub use result::ValidationResult;
pub use stage::TransformStage;
pub use template::render_template;
pub use version::{BASELINE_SCHEMA, DATATYPES_SCRIPT, SchemaVersion};

/// Build a `Vec<EventArg>` from heterogeneous values.
///
/// ```
/// use sbe_model::{EventArg, event_args};
///
/// let args = event_args![12, 4, "unexpected element"];
/// assert_eq!(args[0], EventArg::Integer(12));
/// ```
#[macro_export]
macro_rules! event_args {
    () => { ::std::vec::Vec::<$crate::EventArg>::new() };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::EventArg::from($value)),+]
    };
}
