//! Common utilities module
//!
//! Shared error type, numeric primitives, raster addressing and the
//! row-parallel helpers used by every stage of the pipeline.

pub mod error;
pub mod layout;
pub mod math;
pub mod parallel;

pub use error::{PipelineError, Result};
pub use layout::{NeighborhoodView, RasterLayout};
pub use parallel::{for_each_row, transpose};
