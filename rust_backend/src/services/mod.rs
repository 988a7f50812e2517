//! Field evaluation and layout search.
//!
//! This module sits on top of the illuminance models and layout solvers: it
//! samples whole fixture sets over a grid, annotates fixtures, runs the
//! ranked layout search and offloads evaluations for async hosts.

pub mod annotations;
pub mod background;
pub mod grid_field;
pub mod optimizer;

pub use annotations::{annotate_fixtures, FixtureAnnotation};
pub use background::{spawn_cached_grid_evaluation, spawn_grid_evaluation};
pub use grid_field::{FieldStatistics, GridEvaluator, GridField, GridSpec};
pub use optimizer::{
    fit_score, CandidateOrigin, LayoutCandidate, LayoutOptimizer, LayoutRequest,
};
