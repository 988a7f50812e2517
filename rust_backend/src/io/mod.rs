//! File loading utilities.
//!
//! The parser only consumes text; these loaders read IES files and fixture
//! catalogs from disk and attach file-level error context with `anyhow`.
//!
//! # Example
//!
//! ```no_run
//! use ppfd_rust::io::PhotometryLoader;
//! use std::path::Path;
//!
//! let photometry = PhotometryLoader::load_shared_ies_file(Path::new("fixtures/top_light.ies"))
//!     .expect("Failed to load");
//! println!("Beam angle {:.1}°", photometry.beam_angle());
//! ```

pub mod loaders;


pub use loaders::PhotometryLoader;
