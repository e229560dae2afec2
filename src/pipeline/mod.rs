//! The reply decision pipeline and its templates.

pub mod processor;
pub mod templates;

pub use processor::{DecisionPipeline, Flow};
