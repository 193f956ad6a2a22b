//! Transform pipeline turning an Orchestra repository into an SBE message
//! schema.
//!
//! A [`Pipeline`] runs [`TransformStage`](sbe_model::TransformStage)s in
//! order through a [`TransformEngine`], checking after each stage that its
//! output artifact exists and is not empty.

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod presets;

pub use engine::{CommandEngine, EngineConfig, TransformEngine};
pub use error::{PipelineError, TransformError};
pub use pipeline::{Pipeline, PipelineReport, StageReport};
pub use presets::sbe_stages;
