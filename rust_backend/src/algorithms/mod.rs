//! Photometric models and layout sizing.
//!
//! # Components
//!
//! - [`illuminance`]: per-fixture PPFD contribution at a point
//! - [`layout`]: spacing and coverage solvers
//!
//! # Example
//!
//! ```
//! use ppfd_rust::algorithms::{contribution, solve_spacing};
//! use ppfd_rust::core::{GrowArea, LightSource, Point};
//!
//! let plan = solve_spacing(600.0, &GrowArea::new(10.0, 20.0), 1700.0).unwrap();
//! assert!(plan.fixture_count() >= plan.required_count);
//!
//! let fixture = LightSource::new(1, Point::new(5.0, 5.0), 2.0, 1700.0);
//! assert!(contribution(&fixture, Point::new(5.0, 5.0)) > 0.0);
//! ```

pub mod illuminance;
pub mod layout;

pub use illuminance::{contribution, IlluminanceStrategy};
pub use layout::{
    arrange_grid, place_fixtures, required_fixture_count, solve_coverage, solve_spacing,
    CoverageSizing, SpacingPlan,
};
