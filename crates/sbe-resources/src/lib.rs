#![deny(unsafe_code)]

pub mod error;
pub mod locator;
pub mod packaged;
pub mod paths;
pub mod resolver;

pub use crate::error::ResourceError;
pub use crate::locator::{Resource, ResourceEntry, ResourceLocator};
pub use crate::packaged::{PACKAGED_SCHEME, packaged_names};
pub use crate::paths::{RESOURCES_ENV_VAR, resources_root};
pub use crate::resolver::{ResourceResolver, parent_url};
