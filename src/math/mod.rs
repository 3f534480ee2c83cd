//! Numerical building blocks: linear and nonlinear least squares, kernel density.

pub mod kde;
pub mod lm;
pub mod ols;

pub use kde::*;
pub use lm::*;
pub use ols::*;
