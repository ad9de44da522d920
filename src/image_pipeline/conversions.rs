//! Pipeline conversions module
//!
//! Orchestration of the demosaic and denoise stages into a single development run.

mod develop;
pub mod timing;
pub mod types;

#[cfg(test)]
mod tests;

pub use develop::DevelopPipeline;
pub use timing::{PipelineTimings, StepTiming, Timer};
pub use types::{DevelopConfig, DevelopConfigBuilder, DevelopOutput};
