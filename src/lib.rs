//! paramtype - infer semantic types of HTTP request parameters
//!
//! Normalizes crawler template output, bootstraps labels with naming and
//! value heuristics, trains a gradient-boosted classifier, optionally
//! refines it with operator labels, and writes templates enriched with a
//! predicted type, confidence and a safe baseline value per parameter.

pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod templates;

pub use error::{PipelineError, Result};
