//! Parsers and generators for photometric data formats.
//!
//! # Modules
//!
//! - [`ies_parser`]: Parse IES LM-63 text into a
//!   [`PhotometricFile`](crate::models::PhotometricFile)
//! - [`ies_writer`]: Render a photometric file back to IES LM-63 text
//!
//! # Example
//!
//! ```
//! use ppfd_rust::parsing::{generate_ies, parse_ies};
//!
//! let text = "IESNA:LM-63-2002\nTILT=NONE\n1 -1 1 3 1 1 2 0 0 0\n\
//!             1 1 50\n0 45 90\n0\n1000 500 0\n";
//! let file = parse_ies(text).expect("valid IES text");
//! assert_eq!(file.max_candela(), 1000.0);
//! assert_eq!(parse_ies(&generate_ies(&file)).unwrap().candela(), file.candela());
//! ```

pub mod ies_parser;
pub mod ies_writer;


pub use ies_parser::parse_ies;
pub use ies_writer::generate_ies;
