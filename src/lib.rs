//! `dependent-fit` library crate.
//!
//! Fits joint distributions whose parameters may depend on other dimensions:
//! a covariate is split into intervals, a marginal distribution is fitted in
//! each interval, and a smooth dependency function is fitted through the
//! per-interval parameter estimates.
//!
//! The binary (`dfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable from other front-ends

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;

pub use domain::{DependencyFunction, DistributionDescriptor, Family, IntervalSpacing, ParamSlot};
pub use error::FitError;
pub use fit::{Fit, FitOptions, FitPlan, fit_with_options};
pub use models::{JointDistribution, MarginalDistribution, ParamValue};
