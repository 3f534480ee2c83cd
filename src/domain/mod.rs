//! Domain types used throughout the fitting engine.
//!
//! This module defines:
//!
//! - input configuration enums (`Family`, `DependencyFunction`, `IntervalSpacing`)
//! - per-dimension descriptors (`DistributionDescriptor`)
//! - single-interval fit records (`BasicFit`)

pub mod types;

pub use types::*;
