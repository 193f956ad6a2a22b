//! Library side of the orchestra2sbe command line tool.

pub mod logging;
pub mod pipeline;
pub mod types;
