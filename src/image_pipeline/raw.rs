//! RAW mosaic module
//!
//! Sensor-side data types: the single-channel mosaic and its CFA phase.

pub mod types;

pub use types::{CfaPhase, Channel, RawMosaic};
