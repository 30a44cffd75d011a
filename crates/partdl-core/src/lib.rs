//! partdl core - resumable download engine
//!
//! This crate provides the core download functionality for partdl:
//! - Byte-range resume driven by the partial file's on-disk length
//! - Indefinite fixed-delay retry surfaced as stalled progress events
//! - Adaptive throughput smoothing and ETA estimation
//! - SI-prefix formatting for sizes and rates

mod engine;
mod error;
mod rate;
mod units;

pub use engine::*;
pub use error::*;
pub use rate::*;
pub use units::*;
