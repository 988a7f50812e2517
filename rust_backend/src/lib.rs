//! PPFD prediction, IES photometry and fixture layout search.
//!
//! Leaves first:
//!
//! - [`parsing`]: IES LM-63 text to [`models::PhotometricFile`] and back
//! - [`algorithms`]: per-fixture contribution models and layout sizing
//! - [`services`]: grid evaluation, statistics and the ranked layout search
//! - [`cache`]: memoized contributions for interactive re-evaluation
//!
//! The crate logs through the `log` facade and never installs a logger.

pub mod algorithms;
pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod models;
pub mod parsing;
pub mod services;

#[cfg(feature = "python")]
pub mod python;

pub use error::{LightingError, LightingResult};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// PPFD Rust backend - photometric evaluation and layout search
#[cfg(feature = "python")]
#[pymodule]
fn ppfd_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register_functions(m)?;
    Ok(())
}
