//! Input/output helpers.
//!
//! - sample CSV ingest + validation (`ingest`)
//! - distribution descriptor JSON (`descriptors`)
//! - fit result export (JSON) (`export`)

pub mod descriptors;
pub mod export;
pub mod ingest;

pub use descriptors::*;
pub use export::*;
pub use ingest::*;
