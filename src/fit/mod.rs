//! Conditional-parameter fitting.
//!
//! Responsibilities:
//!
//! - fit one family to one sample ([`marginal`])
//! - split a covariate into intervals and fit each interval ([`interval`])
//! - fit dependency curves through per-interval estimates ([`curve`])
//! - assemble one dimension ([`dimension`]) and all dimensions in parallel
//!   ([`multivariate`])

pub mod curve;
pub mod dimension;
pub mod inspection;
pub mod interval;
pub mod marginal;
pub mod multivariate;

pub use curve::*;
pub use dimension::*;
pub use inspection::*;
pub use interval::*;
pub use marginal::*;
pub use multivariate::*;
