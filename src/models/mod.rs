//! Fitted model representations.
//!
//! - [`param`]: constant or covariate-dependent parameter values
//! - [`distribution`]: fitted marginals and the joint distribution

pub mod distribution;
pub mod param;

pub use distribution::*;
pub use param::*;
